//! Errors raised by the reference runtime.

use stackbind_core::NativeError;
use thiserror::Error;

/// Errors that occur while executing calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    /// A native function failed; carries its error unchanged.
    #[error("native call failed: {0}")]
    Native(#[from] NativeError),

    /// Attempted to call a value that is not a function
    #[error("attempt to call a {type_name} value")]
    NotCallable { type_name: &'static str },

    /// Method lookup produced nil
    #[error("attempt to call missing method '{name}' on a {type_name} value")]
    MissingMethod {
        name: String,
        type_name: &'static str,
    },

    /// Attempted to index a value without fields
    #[error("attempt to index a {type_name} value")]
    IndexNonTable { type_name: &'static str },

    /// A function or table handle outlived its object
    #[error("stale {kind} reference")]
    StaleReference { kind: &'static str },

    /// Nested calls exceeded the configured depth
    #[error("stack overflow: call depth exceeded {limit}")]
    StackOverflow { limit: usize },

    /// An `__index` chain did not terminate
    #[error("'__index' chain too long; possible loop")]
    IndexLoop,
}
