//! Core types for binding native Rust code to a stack based scripting runtime.
//!
//! This crate holds everything the binding layer and a runtime have to agree
//! on:
//!
//! - [`Value`], the dynamically typed stack cell, and its [`ValueKind`] tags
//! - [`Runtime`], the operation set a runtime exposes to native code
//! - [`BlockArena`], storage for native objects owned by the runtime
//! - [`FromStack`] / [`IntoStack`], the checked marshaling table
//! - [`CallContext`], the view of one native call
//! - [`NativeFn`] / [`NativeCallable`], type-erased callables
//! - [`ClassRegistry`], native type identity → bound class
//!
//! The registration facade lives in the `stackbind` crate; a reference
//! runtime lives in `stackbind-vm`.

pub mod arena;
pub mod call_context;
pub mod class_registry;
pub mod convert;
pub mod error;
pub mod handle;
pub mod native_fn;
pub mod runtime;
pub mod type_hash;
pub mod value;

#[cfg(test)]
mod testing;

pub use arena::{BlockArena, ErasedObject, Lifecycle};
pub use call_context::CallContext;
pub use class_registry::{ClassEntry, ClassRegistry, NativeClass};
pub use convert::{FromStack, IntoStack, Ptr};
pub use error::{BlockError, ConversionError, NativeError, RegistrationError};
pub use handle::{BlockHandle, FunctionRef, TableRef};
pub use native_fn::{NativeCallable, NativeFn};
pub use runtime::Runtime;
pub use type_hash::TypeHash;
pub use value::{KindMask, Value, ValueKind};
