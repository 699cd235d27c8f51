//! Registration facade.
//!
//! [`Binder`] publishes free functions and classes into a runtime;
//! [`ClassBinder`] attaches constructors, methods and static functions to
//! one class.
//!
//! # Example
//!
//! ```ignore
//! let mut binder = Binder::new(&mut vm);
//! binder.function("clamp", |x: f64, lo: f64, hi: f64| x.clamp(lo, hi))?;
//! binder
//!     .register_class::<Shape>("Shape", None)?
//!     .method("area", Shape::area)?;
//! binder
//!     .register_class::<Square>("Square", Some("Shape"))?
//!     .constructor(Square::new)?
//!     .method_mut("grow", Square::grow)?
//!     .upcast::<Shape>(|sq| &sq.shape, |sq| &mut sq.shape)?;
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use stackbind_core::{
    CallContext, ClassEntry, ClassRegistry, IntoStack, NativeCallable, NativeClass, NativeError,
    NativeFn, RegistrationError, Runtime, TableRef, TypeHash, Value,
};

use crate::callable::{NativeFunction, NativeMethod, NativeMethodMut};
use crate::config::{BinderConfig, Namespace};
use crate::namespace::publish_in;
use crate::prototype::register_prototype;
use crate::resolver::ArgList;
use crate::trampoline::{
    ConstructorTrampoline, FunctionTrampoline, MethodMutTrampoline, MethodTrampoline,
    RawTrampoline, SharedClasses,
};

/// Registers native functions and classes with a runtime.
pub struct Binder<'r> {
    rt: &'r mut dyn Runtime,
    classes: SharedClasses,
    config: BinderConfig,
}

impl<'r> Binder<'r> {
    pub fn new(rt: &'r mut dyn Runtime) -> Self {
        Self::with_config(rt, BinderConfig::default())
    }

    pub fn with_config(rt: &'r mut dyn Runtime, config: BinderConfig) -> Self {
        Self::with_registry(rt, Arc::new(RwLock::new(ClassRegistry::new())), config)
    }

    /// Bind against an existing class registry, e.g. one obtained from
    /// another binder's [`classes`](Self::classes) for the same runtime.
    pub fn with_registry(
        rt: &'r mut dyn Runtime,
        classes: SharedClasses,
        config: BinderConfig,
    ) -> Self {
        Self {
            rt,
            classes,
            config,
        }
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Switch the namespace used by subsequent registrations.
    pub fn set_namespace(&mut self, namespace: Namespace) {
        self.config.namespace = namespace;
    }

    /// The class registry shared with every trampoline of this binder.
    pub fn classes(&self) -> SharedClasses {
        Arc::clone(&self.classes)
    }

    pub fn runtime_mut(&mut self) -> &mut dyn Runtime {
        &mut *self.rt
    }

    // === Free functions ===

    /// Publish a native function under `name`.
    ///
    /// An existing binding under the same name is replaced.
    pub fn function<Args, F>(&mut self, name: &str, function: F) -> Result<&mut Self, RegistrationError>
    where
        F: NativeFunction<Args>,
        F::Output: IntoStack,
        Args: ArgList + 'static,
    {
        let trampoline = FunctionTrampoline::new(function, self.classes());
        self.publish_function(name, Args::ARITY, trampoline)?;
        Ok(self)
    }

    /// Publish a closure that works on the [`CallContext`] directly.
    pub fn function_raw<F>(&mut self, name: &str, function: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut CallContext<'_>) -> Result<usize, NativeError> + Send + Sync + 'static,
    {
        let trampoline = RawTrampoline::new(function, self.classes(), false);
        self.publish_function(name, 0, trampoline)?;
        Ok(self)
    }

    fn publish_function<C>(&mut self, name: &str, arity: usize, callable: C) -> Result<(), RegistrationError>
    where
        C: NativeCallable + Send + Sync + 'static,
    {
        let qualified = self.config.namespace.qualify(name);
        let function = self.rt.register_native_callable(NativeFn::new(
            TypeHash::from_function(&qualified),
            qualified.as_str(),
            callable,
        ));
        publish_in(&mut *self.rt, &self.config.namespace, name, Value::Function(function))?;
        tracing::debug!(function = %qualified, arity, "function registered");
        Ok(())
    }

    // === Classes ===

    /// Bind `T` as class `name`, optionally inheriting from the class
    /// registered as `parent` in the same namespace.
    pub fn register_class<T: NativeClass>(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<ClassBinder<'_, 'r, T>, RegistrationError> {
        register_prototype::<T>(&mut *self.rt, &self.classes, &self.config, name, parent)?;
        Ok(ClassBinder::new(self))
    }

    /// Bind `T` under its [`NativeClass::NAME`].
    pub fn register<T: NativeClass>(
        &mut self,
        parent: Option<&str>,
    ) -> Result<ClassBinder<'_, 'r, T>, RegistrationError> {
        self.register_class::<T>(T::NAME, parent)
    }

    /// Reopen an already registered class to add members.
    pub fn class<T: NativeClass>(&mut self) -> Result<ClassBinder<'_, 'r, T>, RegistrationError> {
        self.entry::<T>()?;
        Ok(ClassBinder::new(self))
    }

    /// Registration record of `T`.
    pub fn entry<T: NativeClass>(&self) -> Result<ClassEntry, RegistrationError> {
        self.classes
            .read()
            .get::<T>()
            .cloned()
            .ok_or(RegistrationError::UnknownClass {
                type_name: std::any::type_name::<T>(),
            })
    }

    // === Class members ===

    /// Attach a constructor to `T`'s class table under `name`.
    pub fn constructor<T, Args, F>(&mut self, name: &str, function: F) -> Result<&mut Self, RegistrationError>
    where
        T: NativeClass,
        F: NativeFunction<Args, Output = T>,
        Args: ArgList + 'static,
    {
        let trampoline = ConstructorTrampoline::<T, F, Args>::new(function, self.classes());
        self.attach::<T, _>(name, "constructor", TypeHash::from_constructor, trampoline)?;
        Ok(self)
    }

    /// Attach a method taking `&T`.
    pub fn method<T, Args, F>(&mut self, name: &str, method: F) -> Result<&mut Self, RegistrationError>
    where
        T: NativeClass,
        F: NativeMethod<T, Args>,
        F::Output: IntoStack,
        Args: ArgList + 'static,
    {
        let trampoline = MethodTrampoline::<T, F, Args>::new(method, self.classes());
        self.attach::<T, _>(name, "method", TypeHash::from_method, trampoline)?;
        Ok(self)
    }

    /// Attach a method taking `&mut T`.
    pub fn method_mut<T, Args, F>(&mut self, name: &str, method: F) -> Result<&mut Self, RegistrationError>
    where
        T: NativeClass,
        F: NativeMethodMut<T, Args>,
        F::Output: IntoStack,
        Args: ArgList + 'static,
    {
        let trampoline = MethodMutTrampoline::<T, F, Args>::new(method, self.classes());
        self.attach::<T, _>(name, "method", TypeHash::from_method, trampoline)?;
        Ok(self)
    }

    /// Attach a raw method; the receiver is at frame position 1.
    pub fn method_raw<T, F>(&mut self, name: &str, method: F) -> Result<&mut Self, RegistrationError>
    where
        T: NativeClass,
        F: Fn(&mut CallContext<'_>) -> Result<usize, NativeError> + Send + Sync + 'static,
    {
        let trampoline = RawTrampoline::new(method, self.classes(), true);
        self.attach::<T, _>(name, "method", TypeHash::from_method, trampoline)?;
        Ok(self)
    }

    /// Attach a function without receiver to `T`'s class table.
    pub fn static_function<T, Args, F>(
        &mut self,
        name: &str,
        function: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        T: NativeClass,
        F: NativeFunction<Args>,
        F::Output: IntoStack,
        Args: ArgList + 'static,
    {
        let trampoline = FunctionTrampoline::new(function, self.classes());
        self.attach::<T, _>(name, "static function", TypeHash::from_static, trampoline)?;
        Ok(self)
    }

    /// Let methods bound for `P` accept `C` receivers and arguments.
    ///
    /// Returns false if the upcast was refused because it already exists or
    /// would create a cycle.
    pub fn upcast<C, P>(
        &mut self,
        get: fn(&C) -> &P,
        get_mut: fn(&mut C) -> &mut P,
    ) -> Result<bool, RegistrationError>
    where
        C: NativeClass,
        P: NativeClass,
    {
        self.entry::<C>()?;
        self.entry::<P>()?;
        let added = self.classes.write().add_upcast(get, get_mut);
        if added {
            tracing::debug!(child = C::NAME, parent = P::NAME, "upcast registered");
        }
        Ok(added)
    }

    fn attach<T, C>(
        &mut self,
        name: &str,
        kind: &'static str,
        id: fn(TypeHash, &str) -> TypeHash,
        callable: C,
    ) -> Result<(), RegistrationError>
    where
        T: NativeClass,
        C: NativeCallable + Send + Sync + 'static,
    {
        let entry = self.entry::<T>()?;
        let function = self.rt.register_native_callable(NativeFn::new(
            id(entry.id, name),
            format!("{}.{name}", entry.qualified_name),
            callable,
        ));
        self.rt.raw_set(entry.prototype, name, Value::Function(function));
        tracing::debug!(class = %entry.qualified_name, name, kind, "member registered");
        Ok(())
    }
}

impl std::fmt::Debug for Binder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("config", &self.config)
            .field("classes", &*self.classes.read())
            .finish_non_exhaustive()
    }
}

/// Adds members to one registered class.
///
/// Every method consumes and returns the builder so registrations chain
/// with `?`.
pub struct ClassBinder<'b, 'r, T> {
    binder: &'b mut Binder<'r>,
    _marker: PhantomData<fn() -> T>,
}

impl<'b, 'r, T: NativeClass> ClassBinder<'b, 'r, T> {
    fn new(binder: &'b mut Binder<'r>) -> Self {
        Self {
            binder,
            _marker: PhantomData,
        }
    }

    pub fn entry(&self) -> Result<ClassEntry, RegistrationError> {
        self.binder.entry::<T>()
    }

    pub fn prototype(&self) -> Result<TableRef, RegistrationError> {
        self.entry().map(|entry| entry.prototype)
    }

    /// Attach a constructor under the configured default name (`new`).
    pub fn constructor<Args, F>(self, function: F) -> Result<Self, RegistrationError>
    where
        F: NativeFunction<Args, Output = T>,
        Args: ArgList + 'static,
    {
        let name = self.binder.config.constructor_name.clone();
        self.constructor_named(&name, function)
    }

    pub fn constructor_named<Args, F>(self, name: &str, function: F) -> Result<Self, RegistrationError>
    where
        F: NativeFunction<Args, Output = T>,
        Args: ArgList + 'static,
    {
        self.binder.constructor::<T, Args, F>(name, function)?;
        Ok(self)
    }

    pub fn method<Args, F>(self, name: &str, method: F) -> Result<Self, RegistrationError>
    where
        F: NativeMethod<T, Args>,
        F::Output: IntoStack,
        Args: ArgList + 'static,
    {
        self.binder.method::<T, Args, F>(name, method)?;
        Ok(self)
    }

    pub fn method_mut<Args, F>(self, name: &str, method: F) -> Result<Self, RegistrationError>
    where
        F: NativeMethodMut<T, Args>,
        F::Output: IntoStack,
        Args: ArgList + 'static,
    {
        self.binder.method_mut::<T, Args, F>(name, method)?;
        Ok(self)
    }

    pub fn method_raw<F>(self, name: &str, method: F) -> Result<Self, RegistrationError>
    where
        F: Fn(&mut CallContext<'_>) -> Result<usize, NativeError> + Send + Sync + 'static,
    {
        self.binder.method_raw::<T, F>(name, method)?;
        Ok(self)
    }

    pub fn static_function<Args, F>(self, name: &str, function: F) -> Result<Self, RegistrationError>
    where
        F: NativeFunction<Args>,
        F::Output: IntoStack,
        Args: ArgList + 'static,
    {
        self.binder.static_function::<T, Args, F>(name, function)?;
        Ok(self)
    }

    /// Register `T` → `P` accessors; see [`Binder::upcast`].
    pub fn upcast<P: NativeClass>(
        self,
        get: fn(&T) -> &P,
        get_mut: fn(&mut T) -> &mut P,
    ) -> Result<Self, RegistrationError> {
        self.binder.upcast::<T, P>(get, get_mut)?;
        Ok(self)
    }
}
