//! Bind native Rust functions and classes to a stack based scripting
//! runtime.
//!
//! The runtime is reached only through [`Runtime`]; `stackbind-vm` provides
//! a small reference implementation. Registration goes through [`Binder`]:
//!
//! ```ignore
//! use stackbind::{Binder, NativeClass};
//!
//! #[derive(Clone, NativeClass)]
//! struct Point { x: f64, y: f64 }
//!
//! let mut binder = Binder::new(&mut vm);
//! binder.function("hypot", |a: f64, b: f64| a.hypot(b))?;
//! binder
//!     .register::<Point>(None)?
//!     .constructor(|x: f64, y: f64| Point { x, y })?
//!     .method("x", |p: &Point| p.x)?;
//! ```
//!
//! Calling a bound function converts each stack argument with
//! [`FromStack`], invokes the native function and converts the result with
//! [`IntoStack`]. Objects returned by value move into runtime-owned blocks
//! that are finalized exactly once when the collector reclaims them.

pub mod binder;
pub mod callable;
pub mod config;
pub mod lifecycle;
pub mod namespace;
pub mod prototype;
pub mod resolver;
pub mod trampoline;

pub use binder::{Binder, ClassBinder};
pub use callable::{NativeFunction, NativeMethod, NativeMethodMut};
pub use config::{BinderConfig, Namespace};
pub use lifecycle::FinalizeOutcome;
pub use resolver::ArgList;
pub use trampoline::SharedClasses;

pub use stackbind_core;
pub use stackbind_core::{
    BlockHandle, CallContext, ClassEntry, ClassRegistry, ConversionError, FromStack, IntoStack,
    NativeClass, NativeError, Ptr, RegistrationError, Runtime, TableRef, TypeHash, Value,
    ValueKind, impl_object_marshal,
};
pub use stackbind_macros::NativeClass;
