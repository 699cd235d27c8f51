//! Marshaling between stack cells and native values.
//!
//! - [`FromStack`]: read a native value from a frame position (argument side)
//! - [`IntoStack`]: push a native value as the call's result (return side)
//!
//! ## Supported Types
//!
//! - Integers: `i8`..`i64`, `u8`..`u64`, `isize`, `usize` (integer cells only)
//! - Floats: `f32`, `f64` (float or integer cells)
//! - `bool`, `String`, `char`
//! - [`Ptr<T>`]: non-owning, type-checked block reference
//! - Bound classes by value, via [`impl_object_marshal!`](crate::impl_object_marshal)
//!   or `#[derive(NativeClass)]`
//! - Adapters: `Option<T>`, [`Value`], `()`, and `Result<T, E>` on the return side
//!
//! Every conversion is checked. A cell with the wrong tag fails with
//! [`ConversionError::TypeMismatch`]; an integer that does not fit fails with
//! [`ConversionError::IntegerOverflow`]. Nothing is coerced: numeric strings
//! are strings, and floats are not integers.

use std::fmt;
use std::marker::PhantomData;

use crate::call_context::CallContext;
use crate::class_registry::NativeClass;
use crate::error::{ConversionError, NativeError};
use crate::handle::BlockHandle;
use crate::value::{KindMask, Value};

/// Extract a native value from a frame position.
pub trait FromStack: Sized {
    /// Runtime tags this type accepts.
    const EXPECTED: KindMask;

    /// Read the value at the 1-based frame `position`.
    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError>;
}

/// Push a native value as a call result.
pub trait IntoStack {
    /// Push this value and return how many cells were pushed.
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError>;
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_stack_int {
    ($($ty:ty),*) => {
        $(
            impl FromStack for $ty {
                const EXPECTED: KindMask = KindMask::INTEGER;

                fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
                    let v = ctx.runtime().read_integer(position)?;
                    <$ty>::try_from(v).map_err(|_| ConversionError::IntegerOverflow {
                        value: v as i128,
                        target_type: stringify!($ty),
                    })
                }
            }

            impl IntoStack for $ty {
                fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
                    let v = i64::try_from(self).map_err(|_| ConversionError::IntegerOverflow {
                        value: self as i128,
                        target_type: "i64",
                    })?;
                    ctx.runtime_mut().push_integer(v);
                    Ok(1)
                }
            }
        )*
    };
}

impl_stack_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// ============================================================================
// Float implementations
// ============================================================================

impl FromStack for f32 {
    const EXPECTED: KindMask = KindMask::NUMERIC;

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        let v = ctx.runtime().read_float(position)?;
        // Infinities and NaN carry over; finite values must fit
        if v.is_finite() && (v > f32::MAX as f64 || v < f32::MIN as f64) {
            return Err(ConversionError::FloatConversion {
                value: v,
                target_type: "f32",
            });
        }
        Ok(v as f32)
    }
}

impl IntoStack for f32 {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        ctx.runtime_mut().push_float(self as f64);
        Ok(1)
    }
}

impl FromStack for f64 {
    const EXPECTED: KindMask = KindMask::NUMERIC;

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        ctx.runtime().read_float(position)
    }
}

impl IntoStack for f64 {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        ctx.runtime_mut().push_float(self);
        Ok(1)
    }
}

// ============================================================================
// Bool, strings, unit
// ============================================================================

impl FromStack for bool {
    const EXPECTED: KindMask = KindMask::BOOL;

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        ctx.runtime().read_bool(position)
    }
}

impl IntoStack for bool {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        ctx.runtime_mut().push_bool(self);
        Ok(1)
    }
}

impl FromStack for String {
    const EXPECTED: KindMask = KindMask::STRING;

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        ctx.runtime().read_str(position).map(str::to_owned)
    }
}

impl IntoStack for String {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        ctx.runtime_mut().push(Value::from(self));
        Ok(1)
    }
}

impl IntoStack for &str {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        ctx.runtime_mut().push_string(self);
        Ok(1)
    }
}

/// A `char` travels as a string; reading takes the first character.
impl FromStack for char {
    const EXPECTED: KindMask = KindMask::STRING;

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        ctx.runtime()
            .read_str(position)?
            .chars()
            .next()
            .ok_or(ConversionError::EmptyString { target_type: "char" })
    }
}

impl IntoStack for char {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        let mut buf = [0u8; 4];
        ctx.runtime_mut().push_string(self.encode_utf8(&mut buf));
        Ok(1)
    }
}

impl IntoStack for () {
    fn into_stack(self, _ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        Ok(0)
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// Nil reads as `None`; `None` pushes nil.
impl<T: FromStack> FromStack for Option<T> {
    const EXPECTED: KindMask = T::EXPECTED.union(KindMask::NIL);

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        if ctx.runtime().is_nil(position) {
            Ok(None)
        } else {
            T::from_stack(ctx, position).map(Some)
        }
    }
}

impl<T: IntoStack> IntoStack for Option<T> {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        match self {
            Some(value) => value.into_stack(ctx),
            None => {
                ctx.runtime_mut().push_nil();
                Ok(1)
            }
        }
    }
}

/// Untyped passthrough.
impl FromStack for Value {
    const EXPECTED: KindMask = KindMask::all();

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        Ok(ctx.runtime().value_at(position).cloned().unwrap_or_default())
    }
}

impl IntoStack for Value {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        ctx.runtime_mut().push(self);
        Ok(1)
    }
}

/// `Err` aborts the call with [`NativeError::Other`] carrying its message.
impl<T: IntoStack, E: fmt::Display> IntoStack for Result<T, E> {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        match self {
            Ok(value) => value.into_stack(ctx),
            Err(err) => Err(NativeError::other(err.to_string())),
        }
    }
}

// ============================================================================
// Blocks
// ============================================================================

/// Non-owning reference to a live block holding a `T`.
///
/// As an argument it accepts heavy or light blocks whose object is `T` (or
/// upcasts to `T`). Returned, it pushes a light block, which does not keep
/// the object alive.
pub struct Ptr<T> {
    handle: BlockHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Ptr<T> {
    /// Wrap a handle without checking it. Access through
    /// [`CallContext::object`] still validates liveness and type.
    pub fn from_handle(handle: BlockHandle) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    pub fn handle(&self) -> BlockHandle {
        self.handle
    }
}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ptr<T> {}

impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for Ptr<T> {}

impl<T> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ptr<{}>({}:{})",
            std::any::type_name::<T>(),
            self.handle.index,
            self.handle.generation
        )
    }
}

impl<T: NativeClass> FromStack for Ptr<T> {
    const EXPECTED: KindMask = KindMask::ANY_BLOCK;

    fn from_stack(ctx: &CallContext<'_>, position: usize) -> Result<Self, ConversionError> {
        let handle = ctx.runtime().read_block(position)?;
        ctx.resolve::<T>(handle)?;
        Ok(Ptr::from_handle(handle))
    }
}

impl<T: NativeClass> IntoStack for Ptr<T> {
    fn into_stack(self, ctx: &mut CallContext<'_>) -> Result<usize, NativeError> {
        ctx.runtime_mut().push_light_block(self.handle);
        Ok(1)
    }
}

/// Read a bound class by value: the block's object is cloned.
pub fn read_object<T: NativeClass + Clone>(
    ctx: &CallContext<'_>,
    position: usize,
) -> Result<T, ConversionError> {
    let handle = ctx.runtime().read_block(position)?;
    ctx.resolve::<T>(handle).cloned()
}

/// Move a bound class into a fresh block tagged with its prototype.
///
/// The block is allocated and tagged before the value is moved in, so the
/// collector can always finalize it.
pub fn push_object<T: NativeClass>(ctx: &mut CallContext<'_>, value: T) -> Result<usize, NativeError> {
    let prototype = ctx
        .classes()
        .prototype_of::<T>()
        .ok_or(NativeError::UnknownClass {
            type_name: std::any::type_name::<T>(),
        })?;
    let rt = ctx.runtime_mut();
    let handle = rt.allocate_block();
    rt.set_behavior_table(handle, prototype)?;
    rt.blocks_mut().construct(handle, value)?;
    Ok(1)
}

/// Implement [`FromStack`] and [`IntoStack`] for bound classes passed by value.
///
/// ```ignore
/// #[derive(Clone)]
/// struct Point { x: f64, y: f64 }
///
/// impl NativeClass for Point {
///     const NAME: &'static str = "Point";
/// }
///
/// stackbind_core::impl_object_marshal!(Point);
/// ```
#[macro_export]
macro_rules! impl_object_marshal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::FromStack for $ty {
                const EXPECTED: $crate::KindMask = $crate::KindMask::ANY_BLOCK;

                fn from_stack(
                    ctx: &$crate::CallContext<'_>,
                    position: usize,
                ) -> ::std::result::Result<Self, $crate::ConversionError> {
                    $crate::convert::read_object::<$ty>(ctx, position)
                }
            }

            impl $crate::IntoStack for $ty {
                fn into_stack(
                    self,
                    ctx: &mut $crate::CallContext<'_>,
                ) -> ::std::result::Result<usize, $crate::NativeError> {
                    $crate::convert::push_object::<$ty>(ctx, self)
                }
            }
        )*
    };
}
