//! Trampolines: the callables the runtime actually invokes.
//!
//! Each trampoline captures a native function together with the shared
//! class registry. On a call it reads the arguments through [`ArgList`],
//! invokes the function and pushes the result through [`IntoStack`].
//! Resolution happens before any native code runs, so a bad argument
//! leaves native state untouched.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use stackbind_core::{
    CallContext, ClassRegistry, IntoStack, NativeCallable, NativeClass, NativeError, Runtime,
};

use crate::callable::{NativeFunction, NativeMethod, NativeMethodMut};
use crate::lifecycle;
use crate::resolver::ArgList;

/// Class registry shared between a binder and its trampolines.
pub type SharedClasses = Arc<RwLock<ClassRegistry>>;

/// Free function or static function.
pub struct FunctionTrampoline<F, Args> {
    function: F,
    classes: SharedClasses,
    _marker: PhantomData<fn(Args)>,
}

impl<F, Args> FunctionTrampoline<F, Args> {
    pub fn new(function: F, classes: SharedClasses) -> Self {
        Self {
            function,
            classes,
            _marker: PhantomData,
        }
    }
}

impl<F, Args> NativeCallable for FunctionTrampoline<F, Args>
where
    F: NativeFunction<Args>,
    F::Output: IntoStack,
    Args: ArgList,
{
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        let classes = self.classes.read();
        let mut ctx = CallContext::new(rt, &classes);
        let args = Args::resolve(&ctx)?;
        let result = self.function.invoke(args);
        ctx.push(result)
    }
}

/// Method with a shared receiver.
pub struct MethodTrampoline<T, F, Args> {
    method: F,
    classes: SharedClasses,
    _marker: PhantomData<fn(&T, Args)>,
}

impl<T, F, Args> MethodTrampoline<T, F, Args> {
    pub fn new(method: F, classes: SharedClasses) -> Self {
        Self {
            method,
            classes,
            _marker: PhantomData,
        }
    }
}

impl<T, F, Args> NativeCallable for MethodTrampoline<T, F, Args>
where
    T: Any,
    F: NativeMethod<T, Args>,
    F::Output: IntoStack,
    Args: ArgList,
{
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        let classes = self.classes.read();
        let mut ctx = CallContext::method(rt, &classes);
        ctx.this::<T>()?;
        let args = Args::resolve(&ctx)?;
        let result = self.method.invoke(ctx.this::<T>()?, args);
        ctx.push(result)
    }
}

/// Method with a mutable receiver.
pub struct MethodMutTrampoline<T, F, Args> {
    method: F,
    classes: SharedClasses,
    _marker: PhantomData<fn(&mut T, Args)>,
}

impl<T, F, Args> MethodMutTrampoline<T, F, Args> {
    pub fn new(method: F, classes: SharedClasses) -> Self {
        Self {
            method,
            classes,
            _marker: PhantomData,
        }
    }
}

impl<T, F, Args> NativeCallable for MethodMutTrampoline<T, F, Args>
where
    T: Any,
    F: NativeMethodMut<T, Args>,
    F::Output: IntoStack,
    Args: ArgList,
{
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        let classes = self.classes.read();
        let mut ctx = CallContext::method(rt, &classes);
        ctx.this::<T>()?;
        // Arguments are owned copies, so holding them does not alias the receiver.
        let args = Args::resolve(&ctx)?;
        let result = self.method.invoke(ctx.this_mut::<T>()?, args);
        ctx.push(result)
    }
}

/// Constructor: allocate, tag, then construct.
pub struct ConstructorTrampoline<T, F, Args> {
    function: F,
    classes: SharedClasses,
    _marker: PhantomData<fn(Args) -> T>,
}

impl<T, F, Args> ConstructorTrampoline<T, F, Args> {
    pub fn new(function: F, classes: SharedClasses) -> Self {
        Self {
            function,
            classes,
            _marker: PhantomData,
        }
    }
}

impl<T, F, Args> NativeCallable for ConstructorTrampoline<T, F, Args>
where
    T: NativeClass,
    F: NativeFunction<Args, Output = T>,
    Args: ArgList,
{
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        let classes = self.classes.read();
        let prototype = classes
            .prototype_of::<T>()
            .ok_or(NativeError::UnknownClass {
                type_name: std::any::type_name::<T>(),
            })?;
        let mut ctx = CallContext::new(rt, &classes);
        let args = Args::resolve(&ctx)?;
        let handle = lifecycle::allocate_tagged(ctx.runtime_mut(), prototype)?;
        let value = self.function.invoke(args);
        lifecycle::construct(ctx.runtime_mut(), handle, value)?;
        Ok(1)
    }
}

/// The `__gc` hook shared by every prototype.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizerTrampoline;

impl NativeCallable for FinalizerTrampoline {
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        lifecycle::finalize(rt);
        Ok(0)
    }
}

/// A closure working on the [`CallContext`] directly.
pub struct RawTrampoline<F> {
    function: F,
    classes: SharedClasses,
    method: bool,
}

impl<F> RawTrampoline<F> {
    /// `method` selects the frame layout: receiver at position 1 and
    /// arguments from position 2.
    pub fn new(function: F, classes: SharedClasses, method: bool) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<usize, NativeError>,
    {
        Self {
            function,
            classes,
            method,
        }
    }
}

impl<F> NativeCallable for RawTrampoline<F>
where
    F: Fn(&mut CallContext<'_>) -> Result<usize, NativeError>,
{
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn call(&self, rt: &mut dyn Runtime) -> Result<usize, NativeError> {
        let classes = self.classes.read();
        let mut ctx = if self.method {
            CallContext::method(rt, &classes)
        } else {
            CallContext::new(rt, &classes)
        };
        (self.function)(&mut ctx)
    }
}
