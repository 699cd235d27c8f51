//! Per-arity adapters over plain Rust callables.
//!
//! [`NativeFunction`] covers free functions, static functions and
//! constructors; [`NativeMethod`] and [`NativeMethodMut`] cover functions
//! taking the receiver as `&T` or `&mut T`. All three are implemented for
//! every `Fn` of arity 0..=12, so `fn` items and closures register
//! directly:
//!
//! ```ignore
//! fn add(a: i64, b: i64) -> i64 { a + b }
//! binder.function("add", add)?;
//!
//! binder
//!     .register_class::<Counter>("Counter", None)?
//!     .method("get", Counter::get)?
//!     .method_mut("bump", |c: &mut Counter, by: i64| c.value += by)?;
//! ```

/// A free function taking the tuple `Args`.
pub trait NativeFunction<Args>: Send + Sync + 'static {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

/// A function taking a shared receiver followed by `Args`.
pub trait NativeMethod<T, Args>: Send + Sync + 'static {
    type Output;

    fn invoke(&self, this: &T, args: Args) -> Self::Output;
}

/// A function taking a mutable receiver followed by `Args`.
pub trait NativeMethodMut<T, Args>: Send + Sync + 'static {
    type Output;

    fn invoke(&self, this: &mut T, args: Args) -> Self::Output;
}

macro_rules! impl_callables {
    ($($ty:ident $var:ident),*) => {
        impl<Func, Ret, $($ty),*> NativeFunction<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> Ret + Send + Sync + 'static,
        {
            type Output = Ret;

            fn invoke(&self, ($($var,)*): ($($ty,)*)) -> Ret {
                (self)($($var),*)
            }
        }

        impl<Func, Ret, This, $($ty),*> NativeMethod<This, ($($ty,)*)> for Func
        where
            Func: Fn(&This, $($ty),*) -> Ret + Send + Sync + 'static,
        {
            type Output = Ret;

            fn invoke(&self, this: &This, ($($var,)*): ($($ty,)*)) -> Ret {
                (self)(this, $($var),*)
            }
        }

        impl<Func, Ret, This, $($ty),*> NativeMethodMut<This, ($($ty,)*)> for Func
        where
            Func: Fn(&mut This, $($ty),*) -> Ret + Send + Sync + 'static,
        {
            type Output = Ret;

            fn invoke(&self, this: &mut This, ($($var,)*): ($($ty,)*)) -> Ret {
                (self)(this, $($var),*)
            }
        }
    };
}

impl_callables!();
impl_callables!(A a);
impl_callables!(A a, B b);
impl_callables!(A a, B b, C c);
impl_callables!(A a, B b, C c, D d);
impl_callables!(A a, B b, C c, D d, E e);
impl_callables!(A a, B b, C c, D d, E e, F f);
impl_callables!(A a, B b, C c, D d, E e, F f, G g);
impl_callables!(A a, B b, C c, D d, E e, F f, G g, H h);
impl_callables!(A a, B b, C c, D d, E e, F f, G g, H h, I i);
impl_callables!(A a, B b, C c, D d, E e, F f, G g, H h, I i, J j);
impl_callables!(A a, B b, C c, D d, E e, F f, G g, H h, I i, J j, K k);
impl_callables!(A a, B b, C c, D d, E e, F f, G g, H h, I i, J j, K k, L l);
