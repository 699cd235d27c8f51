//! Hash tables with metatables.

use std::sync::Arc;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use stackbind_core::{BlockHandle, FunctionRef, TableRef, Value};

/// A hashable non-string table key.
///
/// Floats with an exact integer value are normalized to [`TableKey::Integer`]
/// so `t[1]` and `t[1.0]` address the same field. Nil and NaN are not valid
/// keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKey {
    Bool(bool),
    Integer(i64),
    Number(OrderedFloat<f64>),
    Table(TableRef),
    Function(FunctionRef),
    Block(BlockHandle),
    LightBlock(BlockHandle),
}

impl TableKey {
    /// Key for a non-string value. Returns `None` for nil, NaN and strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Nil | Value::String(_) => return None,
            Value::Bool(b) => TableKey::Bool(*b),
            Value::Integer(i) => TableKey::Integer(*i),
            Value::Number(n) if n.is_nan() => return None,
            Value::Number(n) => {
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 {
                    TableKey::Integer(*n as i64)
                } else {
                    TableKey::Number(OrderedFloat(*n))
                }
            }
            Value::Table(t) => TableKey::Table(*t),
            Value::Function(f) => TableKey::Function(*f),
            Value::Block(h) => TableKey::Block(*h),
            Value::LightBlock(h) => TableKey::LightBlock(*h),
        })
    }

    pub fn to_value(self) -> Value {
        match self {
            TableKey::Bool(b) => Value::Bool(b),
            TableKey::Integer(i) => Value::Integer(i),
            TableKey::Number(n) => Value::Number(n.0),
            TableKey::Table(t) => Value::Table(t),
            TableKey::Function(f) => Value::Function(f),
            TableKey::Block(h) => Value::Block(h),
            TableKey::LightBlock(h) => Value::LightBlock(h),
        }
    }
}

/// A runtime table: string fields, other keyed fields and an optional
/// metatable.
#[derive(Debug, Default, Clone)]
pub struct Table {
    named: FxHashMap<Arc<str>, Value>,
    keyed: FxHashMap<TableKey, Value>,
    metatable: Option<TableRef>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_str(&self, key: &str) -> Value {
        self.named.get(key).cloned().unwrap_or_default()
    }

    /// Set a string field. Nil removes it.
    pub fn set_str(&mut self, key: &str, value: Value) {
        if value.is_nil() {
            self.named.remove(key);
        } else if let Some(slot) = self.named.get_mut(key) {
            *slot = value;
        } else {
            self.named.insert(Arc::from(key), value);
        }
    }

    /// Get the field for any key; invalid keys read as nil.
    pub fn get(&self, key: &Value) -> Value {
        match key {
            Value::String(s) => self.get_str(s),
            other => TableKey::from_value(other)
                .and_then(|k| self.keyed.get(&k).cloned())
                .unwrap_or_default(),
        }
    }

    /// Set the field for any key. Returns false for nil and NaN keys.
    pub fn set(&mut self, key: &Value, value: Value) -> bool {
        match key {
            Value::String(s) => {
                self.set_str(s, value);
                true
            }
            other => match TableKey::from_value(other) {
                Some(k) => {
                    if value.is_nil() {
                        self.keyed.remove(&k);
                    } else {
                        self.keyed.insert(k, value);
                    }
                    true
                }
                None => false,
            },
        }
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable
    }

    pub fn set_metatable(&mut self, metatable: Option<TableRef>) {
        self.metatable = metatable;
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.named.len() + self.keyed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every value reachable from this table: keys, values and metatable.
    pub(crate) fn references(&self) -> impl Iterator<Item = Value> + '_ {
        self.named
            .values()
            .cloned()
            .chain(
                self.keyed
                    .iter()
                    .flat_map(|(k, v)| [k.to_value(), v.clone()]),
            )
            .chain(self.metatable.map(Value::Table))
    }
}
