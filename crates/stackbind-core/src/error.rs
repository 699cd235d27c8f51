//! Error types for marshaling, dispatch and registration.

use thiserror::Error;

use crate::arena::Lifecycle;

/// Errors raised by [`BlockArena`](crate::BlockArena) access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockError {
    /// The handle's slot has been freed (or never existed)
    #[error("stale block handle: block at index {index} has been freed")]
    Stale { index: u32 },

    /// The block exists but holds no live object
    #[error("block holds no live object (state: {state})")]
    NotLive { state: Lifecycle },

    /// The block holds an object of a different type
    #[error("block type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Construction into a block that is not uninitialized
    #[error("block already constructed (state: {state})")]
    AlreadyConstructed { state: Lifecycle },
}

/// Errors that can occur when converting between stack values and native values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The cell's runtime tag does not match the expected native category
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Integer does not fit in the target type
    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow {
        value: i128,
        target_type: &'static str,
    },

    /// Float cannot be represented in the target type
    #[error("float conversion error: value {value} cannot be represented as {target_type}")]
    FloatConversion {
        value: f64,
        target_type: &'static str,
    },

    /// A character was expected but the string is empty
    #[error("empty string cannot be converted to {target_type}")]
    EmptyString { target_type: &'static str },

    /// The block handle refers to a freed slot
    #[error("stale handle: block at index {index} has been freed")]
    StaleHandle { index: u32 },

    /// The block exists but its object is not live
    #[error("dead object: block is {state}")]
    DeadObject { state: Lifecycle },

    /// Generic conversion failure
    #[error("conversion failed: {message}")]
    Failed { message: String },
}

impl ConversionError {
    /// Create a type mismatch error.
    pub fn mismatch(expected: &'static str, actual: &'static str) -> Self {
        ConversionError::TypeMismatch { expected, actual }
    }
}

impl From<BlockError> for ConversionError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::Stale { index } => ConversionError::StaleHandle { index },
            BlockError::NotLive { state } => ConversionError::DeadObject { state },
            BlockError::TypeMismatch { expected, actual } => {
                ConversionError::TypeMismatch { expected, actual }
            }
            other @ BlockError::AlreadyConstructed { .. } => ConversionError::Failed {
                message: other.to_string(),
            },
        }
    }
}

/// Errors that can occur during native function execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// Error converting a return value (or a raw read)
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error converting the argument at `index` (0-based, receiver excluded)
    #[error("bad argument #{index}: {source}")]
    Argument {
        index: usize,
        source: ConversionError,
    },

    /// Invalid receiver for a method call
    #[error("invalid 'self' reference: {message}")]
    InvalidThis { message: String },

    /// A native type was pushed or looked up before its class was registered
    #[error("class not registered for native type {type_name}")]
    UnknownClass { type_name: &'static str },

    /// Block arena failure outside argument conversion
    #[error("block error: {0}")]
    Block(#[from] BlockError),

    /// Native function panicked
    #[error("native function panicked: {message}")]
    Panic { message: String },

    /// Generic native error
    #[error("native error: {message}")]
    Other { message: String },
}

impl NativeError {
    /// Create an "invalid this" error with a message.
    pub fn invalid_this(message: impl Into<String>) -> Self {
        NativeError::InvalidThis {
            message: message.into(),
        }
    }

    /// Create a generic native error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }

    /// Wrap a conversion failure of the argument at `index`.
    pub fn argument(index: usize, source: ConversionError) -> Self {
        NativeError::Argument { index, source }
    }

    /// The underlying conversion error, if this is a conversion failure.
    pub fn conversion(&self) -> Option<&ConversionError> {
        match self {
            NativeError::Conversion(err) | NativeError::Argument { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

/// Errors that occur while binding functions and classes.
///
/// These indicate a mistake in the binding setup and are expected to abort
/// initialization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A binding already exists under this name
    #[error("duplicate class: '{name}' is already bound in {namespace}")]
    DuplicateClass { name: String, namespace: String },

    /// The parent name does not resolve to a registered prototype
    #[error("unknown parent class '{name}' in {namespace}")]
    UnknownParent { name: String, namespace: String },

    /// A member was attached to a type whose class was never registered
    #[error("class not registered for native type {type_name}")]
    UnknownClass { type_name: &'static str },

    /// The native type already has a class
    #[error("native type {type_name} is already registered as '{name}'")]
    TypeAlreadyRegistered {
        type_name: &'static str,
        name: String,
    },

    /// The package name is bound to something other than a table
    #[error("namespace '{namespace}' is bound to a {actual}, not a table")]
    NamespaceNotTable {
        namespace: String,
        actual: &'static str,
    },
}
