//! Binder configuration.

use std::fmt;

/// Where a binder publishes the names it registers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    /// The runtime's global environment.
    #[default]
    Global,
    /// A table stored under this global name, created on first use.
    Table(String),
}

impl Namespace {
    pub fn table(name: impl Into<String>) -> Self {
        Namespace::Table(name.into())
    }

    /// Package name, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            Namespace::Global => None,
            Namespace::Table(name) => Some(name),
        }
    }

    /// `name` prefixed with the package, e.g. `geo.Point`.
    pub fn qualify(&self, name: &str) -> String {
        match self {
            Namespace::Global => name.to_string(),
            Namespace::Table(package) => format!("{package}.{name}"),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Global => f.write_str("global namespace"),
            Namespace::Table(name) => write!(f, "namespace '{name}'"),
        }
    }
}

/// Configuration of a [`Binder`](crate::Binder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    /// Target of every registration.
    pub namespace: Namespace,
    /// Field name used by [`ClassBinder::constructor`](crate::ClassBinder::constructor).
    pub constructor_name: String,
    /// Store each prototype in the runtime's registry table under its
    /// qualified name.
    pub mirror_in_registry: bool,
}

impl BinderConfig {
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_constructor_name(mut self, name: impl Into<String>) -> Self {
        self.constructor_name = name.into();
        self
    }

    pub fn with_registry_mirror(mut self, enabled: bool) -> Self {
        self.mirror_in_registry = enabled;
        self
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            namespace: Namespace::Global,
            constructor_name: "new".to_string(),
            mirror_in_registry: true,
        }
    }
}
