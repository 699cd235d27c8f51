//! Prototype tables for bound classes.
//!
//! A class is represented to scripts by one table that serves both as the
//! class object (constructors and static functions live in it) and as the
//! behavior table of every instance:
//!
//! - `__index` points back at the table, so instances find its methods
//! - `__gc` holds the finalizer trampoline
//! - the metatable is the parent class's prototype, so failed lookups
//!   continue with the parent

use stackbind_core::{
    ClassEntry, NativeClass, NativeFn, RegistrationError, Runtime, TableRef, TypeHash, Value,
};

use crate::config::BinderConfig;
use crate::namespace::{lookup_in, publish_in};
use crate::trampoline::{FinalizerTrampoline, SharedClasses};

/// Build, publish and record the prototype of `T` under `name`.
///
/// Everything is validated before the runtime is touched, so a failed
/// registration leaves existing bindings intact.
pub fn register_prototype<T: NativeClass>(
    rt: &mut dyn Runtime,
    classes: &SharedClasses,
    config: &BinderConfig,
    name: &str,
    parent: Option<&str>,
) -> Result<ClassEntry, RegistrationError> {
    let namespace = &config.namespace;

    if !lookup_in(rt, namespace, name)?.is_nil() {
        return Err(RegistrationError::DuplicateClass {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
    }

    let parent_prototype = match parent {
        None => None,
        Some(parent_name) => {
            let known = match lookup_in(rt, namespace, parent_name)? {
                Value::Table(table) if classes.read().by_prototype(table).is_some() => {
                    Some(table)
                }
                _ => None,
            };
            Some(known.ok_or_else(|| RegistrationError::UnknownParent {
                name: parent_name.to_string(),
                namespace: namespace.to_string(),
            })?)
        }
    };

    if let Some(existing) = classes.read().get::<T>() {
        return Err(RegistrationError::TypeAlreadyRegistered {
            type_name: std::any::type_name::<T>(),
            name: existing.qualified_name.clone(),
        });
    }

    let qualified_name = namespace.qualify(name);
    let id = TypeHash::from_qualified(namespace.package(), name);
    let prototype = build_table(rt, id, &qualified_name, parent_prototype);

    publish_in(rt, namespace, name, Value::Table(prototype))?;
    let registry = rt.registry_table();
    rt.raw_set(registry, &anchor_key(id), Value::Table(prototype));
    if config.mirror_in_registry {
        rt.raw_set(registry, &qualified_name, Value::Table(prototype));
    }

    let entry = ClassEntry {
        name: name.to_string(),
        qualified_name,
        id,
        type_name: std::any::type_name::<T>(),
        prototype,
        parent: parent_prototype,
    };
    classes.write().insert::<T>(entry.clone())?;

    tracing::debug!(
        class = %entry.qualified_name,
        native = entry.type_name,
        parent = parent.unwrap_or("none"),
        "class registered"
    );
    Ok(entry)
}

/// Registry key that keeps a prototype alive for the life of the runtime,
/// whether or not its published name is still reachable.
pub fn anchor_key(id: TypeHash) -> String {
    format!("stackbind.prototype.{id}")
}

fn build_table(
    rt: &mut dyn Runtime,
    id: TypeHash,
    qualified_name: &str,
    parent: Option<TableRef>,
) -> TableRef {
    let table = rt.new_table();
    rt.raw_set(table, "__index", Value::Table(table));
    let finalizer = rt.register_native_callable(NativeFn::new(
        TypeHash::finalizer_of(id),
        format!("{qualified_name}.__gc"),
        FinalizerTrampoline,
    ));
    rt.raw_set(table, "__gc", Value::Function(finalizer));
    rt.set_metatable(table, parent);
    table
}
