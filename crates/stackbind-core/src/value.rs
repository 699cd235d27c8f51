//! Runtime value model for stack cells.
//!
//! A [`Value`] is what occupies one positional cell of a call frame. Every
//! value carries a runtime tag ([`ValueKind`]) that the marshaling layer
//! checks before converting it to a native type.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::handle::{BlockHandle, FunctionRef, TableRef};

/// A dynamically typed value stored in a stack cell, table field or global.
///
/// Strings are reference counted so that copying values between the stack
/// and tables never reallocates.
#[derive(Clone, Default, PartialEq)]
pub enum Value {
    /// Absence of a value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Integer value (all native integer widths are stored as i64)
    Integer(i64),
    /// Floating point value (f32 and f64 are both stored as f64)
    Number(f64),
    /// Immutable string value
    String(Arc<str>),
    /// Reference to a runtime table
    Table(TableRef),
    /// Reference to a runtime callable
    Function(FunctionRef),
    /// Owning reference to a managed native block
    Block(BlockHandle),
    /// Non-owning reference to a managed native block
    LightBlock(BlockHandle),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// The runtime tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Table(_) => ValueKind::Table,
            Value::Function(_) => ValueKind::Function,
            Value::Block(_) => ValueKind::Block,
            Value::LightBlock(_) => ValueKind::LightBlock,
        }
    }

    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Check if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<TableRef> {
        match self {
            Value::Table(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<FunctionRef> {
        match self {
            Value::Function(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the block handle for heavy and light blocks alike.
    pub fn as_block(&self) -> Option<BlockHandle> {
        match self {
            Value::Block(h) | Value::LightBlock(h) => Some(*h),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Integer(v) => write!(f, "Integer({})", v),
            Value::Number(v) => write!(f, "Number({})", v),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Table(t) => write!(f, "Table({}:{})", t.index, t.generation),
            Value::Function(r) => write!(f, "Function({}:{})", r.index, r.generation),
            Value::Block(h) => write!(f, "Block({}:{})", h.index, h.generation),
            Value::LightBlock(h) => write!(f, "LightBlock({}:{})", h.index, h.generation),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

/// Runtime tag of a stack cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Bool,
    Integer,
    Number,
    String,
    Table,
    Function,
    Block,
    LightBlock,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Table => "table",
            ValueKind::Function => "function",
            ValueKind::Block => "userdata",
            ValueKind::LightBlock => "light userdata",
        }
    }

    /// The single-bit mask for this tag.
    pub fn mask(self) -> KindMask {
        match self {
            ValueKind::Nil => KindMask::NIL,
            ValueKind::Bool => KindMask::BOOL,
            ValueKind::Integer => KindMask::INTEGER,
            ValueKind::Number => KindMask::NUMBER,
            ValueKind::String => KindMask::STRING,
            ValueKind::Table => KindMask::TABLE,
            ValueKind::Function => KindMask::FUNCTION,
            ValueKind::Block => KindMask::BLOCK,
            ValueKind::LightBlock => KindMask::LIGHT_BLOCK,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of runtime tags a marshaled type accepts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KindMask: u16 {
        const NIL = 1 << 0;
        const BOOL = 1 << 1;
        const INTEGER = 1 << 2;
        const NUMBER = 1 << 3;
        const STRING = 1 << 4;
        const TABLE = 1 << 5;
        const FUNCTION = 1 << 6;
        const BLOCK = 1 << 7;
        const LIGHT_BLOCK = 1 << 8;

        /// Integers are numbers for float parameters.
        const NUMERIC = Self::INTEGER.bits() | Self::NUMBER.bits();
        /// Heavy or light native blocks.
        const ANY_BLOCK = Self::BLOCK.bits() | Self::LIGHT_BLOCK.bits();
    }
}

impl KindMask {
    /// Check whether a value with the given tag is accepted.
    pub fn accepts(self, kind: ValueKind) -> bool {
        self.contains(kind.mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_names() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::Integer(0).type_name(), "integer");
        assert_eq!(Value::Number(0.0).type_name(), "number");
        assert_eq!(Value::Bool(false).type_name(), "boolean");
        assert_eq!(Value::string("").type_name(), "string");
        assert_eq!(
            Value::LightBlock(BlockHandle::new(0, 0)).type_name(),
            "light userdata"
        );
    }

    #[test]
    fn integer_is_not_float_for_accessor() {
        assert_eq!(Value::Integer(3).as_integer(), Some(3));
        assert_eq!(Value::Number(3.0).as_integer(), None);
        assert_eq!(Value::Integer(3).as_number(), Some(3.0));
    }

    #[test]
    fn heavy_and_light_blocks_share_handle() {
        let h = BlockHandle::new(4, 2);
        assert_eq!(Value::Block(h).as_block(), Some(h));
        assert_eq!(Value::LightBlock(h).as_block(), Some(h));
        assert_eq!(Value::Integer(1).as_block(), None);
    }

    #[test]
    fn kind_mask_accepts() {
        assert!(KindMask::NUMERIC.accepts(ValueKind::Integer));
        assert!(KindMask::NUMERIC.accepts(ValueKind::Number));
        assert!(!KindMask::NUMERIC.accepts(ValueKind::String));
        assert!(KindMask::ANY_BLOCK.accepts(ValueKind::LightBlock));
        assert!(!KindMask::INTEGER.accepts(ValueKind::Number));
    }

    #[test]
    fn string_values_compare_by_content() {
        assert_eq!(Value::string("hello"), Value::from("hello".to_string()));
        assert_ne!(Value::string("hello"), Value::string("world"));
    }
}
