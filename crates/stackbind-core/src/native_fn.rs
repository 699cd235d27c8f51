//! Native function storage and callable trait.

use std::fmt;
use std::sync::Arc;

use crate::TypeHash;
use crate::error::NativeError;
use crate::runtime::Runtime;

/// Type-erased native function.
///
/// This wraps any callable that implements [`NativeCallable`], allowing
/// trampolines of different signatures to be stored uniformly by the
/// runtime. The callable is shared behind an `Arc`, so cloning is cheap and
/// the captured state is immutable after registration.
pub struct NativeFn {
    /// Identity of the bound callable (see [`TypeHash::from_function`] and friends)
    pub id: TypeHash,
    name: Arc<str>,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Create a new NativeFn from a callable with a specific ID and display name.
    pub fn new<F>(id: TypeHash, name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self {
            id,
            name: name.into(),
            inner: Arc::new(f),
        }
    }

    /// Name the function was registered under, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call this native function against the runtime's current frame.
    ///
    /// Returns the number of values pushed as results.
    pub fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        self.inner.call(rt)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Clone for NativeFn {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Trait for callable native functions.
///
/// The runtime invokes `call` with the arguments already in the current
/// frame; the callable pushes its results and returns how many it pushed.
pub trait NativeCallable {
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut dyn Runtime) -> Result<usize, NativeError>,
{
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        (self)(rt)
    }
}
