//! Call context bridging the runtime's frame and native Rust functions.

use std::any::Any;
use std::fmt;

use crate::class_registry::{ClassRegistry, NativeClass};
use crate::convert::{FromStack, IntoStack, Ptr};
use crate::error::{ConversionError, NativeError};
use crate::handle::BlockHandle;
use crate::runtime::Runtime;
use crate::value::Value;

/// Context for one native call.
///
/// Wraps the runtime's current frame together with the class registry so
/// conversions can resolve bound classes. Arguments are addressed by 0-based
/// index; the context maps them to frame positions:
///
/// - free functions and constructors: argument `i` is at position `1 + i`
/// - methods: the receiver is at position 1, argument `i` at `2 + i`
///
/// ```ignore
/// let x: i32 = ctx.arg(0)?;
/// let name: &str = ctx.arg_str(1)?;
/// ctx.push(x * 2)?;
/// ```
pub struct CallContext<'a> {
    rt: &'a mut dyn Runtime,
    classes: &'a ClassRegistry,
    /// Frame position of argument 0
    arg_base: usize,
}

impl<'a> CallContext<'a> {
    /// Context for a free function or constructor call.
    pub fn new(rt: &'a mut dyn Runtime, classes: &'a ClassRegistry) -> Self {
        Self {
            rt,
            classes,
            arg_base: 1,
        }
    }

    /// Context for a method call; the receiver occupies position 1.
    pub fn method(rt: &'a mut dyn Runtime, classes: &'a ClassRegistry) -> Self {
        Self {
            rt,
            classes,
            arg_base: 2,
        }
    }

    /// Frame position of argument 0.
    pub fn arg_base(&self) -> usize {
        self.arg_base
    }

    pub fn is_method(&self) -> bool {
        self.arg_base == 2
    }

    /// Number of arguments passed (excluding the receiver for methods).
    pub fn arg_count(&self) -> usize {
        self.rt.frame_size().saturating_sub(self.arg_base - 1)
    }

    /// Frame position of argument `index`.
    pub fn position(&self, index: usize) -> usize {
        self.arg_base + index
    }

    /// Get a typed argument. Missing arguments read as nil.
    pub fn arg<T: FromStack>(&self, index: usize) -> Result<T, NativeError> {
        T::from_stack(self, self.position(index)).map_err(|e| NativeError::argument(index, e))
    }

    /// Get an argument as an untyped value.
    pub fn arg_value(&self, index: usize) -> Value {
        self.rt
            .value_at(self.position(index))
            .cloned()
            .unwrap_or_default()
    }

    /// Borrow a string argument without copying. The view lives as long as
    /// this context.
    pub fn arg_str(&self, index: usize) -> Result<&str, NativeError> {
        self.rt
            .read_str(self.position(index))
            .map_err(|e| NativeError::argument(index, e))
    }

    /// Block handle of the method receiver at position 1.
    pub fn receiver(&self) -> Result<BlockHandle, NativeError> {
        match self.rt.value_at(1) {
            Some(Value::Block(h)) | Some(Value::LightBlock(h)) => Ok(*h),
            other => Err(NativeError::invalid_this(format!(
                "expected userdata receiver, got {}",
                other.map(Value::type_name).unwrap_or("no value")
            ))),
        }
    }

    /// Borrow the receiver as `T`, following registered upcasts.
    pub fn this<T: Any>(&self) -> Result<&T, NativeError> {
        let handle = self.receiver()?;
        self.resolve::<T>(handle)
            .map_err(|e| NativeError::invalid_this(e.to_string()))
    }

    /// Mutably borrow the receiver as `T`, following registered upcasts.
    pub fn this_mut<T: Any>(&mut self) -> Result<&mut T, NativeError> {
        let handle = self.receiver()?;
        self.resolve_mut::<T>(handle)
            .map_err(|e| NativeError::invalid_this(e.to_string()))
    }

    /// Borrow the live object a block holds as `T`.
    pub fn resolve<T: Any>(&self, handle: BlockHandle) -> Result<&T, ConversionError> {
        let blocks = self.rt.blocks();
        let (object, type_id) = blocks.object(handle)?;
        self.classes
            .view::<T>(object, type_id)
            .ok_or_else(|| ConversionError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: blocks.type_name(handle).unwrap_or("unknown"),
            })
    }

    /// Mutable variant of [`resolve`](Self::resolve).
    pub fn resolve_mut<T: Any>(&mut self, handle: BlockHandle) -> Result<&mut T, ConversionError> {
        let classes = self.classes;
        let blocks = self.rt.blocks_mut();
        let actual = blocks.type_name(handle).unwrap_or("unknown");
        let (object, type_id) = blocks.object_mut(handle)?;
        classes
            .view_mut::<T>(object, type_id)
            .ok_or(ConversionError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual,
            })
    }

    /// Borrow the object behind a [`Ptr`].
    pub fn object<T: NativeClass>(&self, ptr: Ptr<T>) -> Result<&T, ConversionError> {
        self.resolve::<T>(ptr.handle())
    }

    /// Mutably borrow the object behind a [`Ptr`].
    pub fn object_mut<T: NativeClass>(&mut self, ptr: Ptr<T>) -> Result<&mut T, ConversionError> {
        self.resolve_mut::<T>(ptr.handle())
    }

    /// Push a typed result, returning the number of cells pushed.
    pub fn push<T: IntoStack>(&mut self, value: T) -> Result<usize, NativeError> {
        value.into_stack(self)
    }

    pub fn runtime(&self) -> &(dyn Runtime + 'a) {
        &*self.rt
    }

    pub fn runtime_mut(&mut self) -> &mut (dyn Runtime + 'a) {
        &mut *self.rt
    }

    pub fn classes(&self) -> &'a ClassRegistry {
        self.classes
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("arg_count", &self.arg_count())
            .field("arg_base", &self.arg_base)
            .finish()
    }
}
