//! Name lookup and publishing relative to a [`Namespace`].

use stackbind_core::{RegistrationError, Runtime, TableRef, Value};

use crate::config::Namespace;

/// The package table of `namespace`, if it exists.
fn package_table(
    rt: &dyn Runtime,
    namespace: &Namespace,
) -> Result<Option<TableRef>, RegistrationError> {
    let Some(package) = namespace.package() else {
        return Ok(None);
    };
    match rt.get_global(package) {
        Value::Table(table) => Ok(Some(table)),
        Value::Nil => Ok(None),
        other => Err(RegistrationError::NamespaceNotTable {
            namespace: package.to_string(),
            actual: other.type_name(),
        }),
    }
}

/// Read `name` from the namespace. A missing package table reads as nil.
pub fn lookup_in(
    rt: &dyn Runtime,
    namespace: &Namespace,
    name: &str,
) -> Result<Value, RegistrationError> {
    match namespace {
        Namespace::Global => Ok(rt.get_global(name)),
        Namespace::Table(_) => Ok(package_table(rt, namespace)?
            .map(|table| rt.raw_get(table, name))
            .unwrap_or_default()),
    }
}

/// Store `value` under `name` in the namespace, creating the package table
/// on first use.
pub fn publish_in(
    rt: &mut dyn Runtime,
    namespace: &Namespace,
    name: &str,
    value: Value,
) -> Result<(), RegistrationError> {
    let Some(package) = namespace.package() else {
        rt.set_global(name, value);
        return Ok(());
    };
    let table = match package_table(rt, namespace)? {
        Some(table) => table,
        None => {
            let table = rt.new_table();
            rt.set_global(package, Value::Table(table));
            tracing::debug!(package, "package table created");
            table
        }
    };
    rt.raw_set(table, name, value);
    Ok(())
}
