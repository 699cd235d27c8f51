//! The operation set consumed from a scripting runtime.
//!
//! [`Runtime`] is everything the binding layer needs from the embedding
//! runtime: positional access to the current call frame, pushes, a block
//! arena, raw table operations, globals, a registry table and a way to turn
//! a [`NativeFn`] into a runtime-callable value. The trait is object safe;
//! trampolines receive `&mut dyn Runtime`.
//!
//! Only a handful of methods are required. Type predicates, validated reads
//! and typed pushes are provided on top of [`value_at`](Runtime::value_at)
//! and [`push`](Runtime::push).

use crate::arena::BlockArena;
use crate::error::{BlockError, ConversionError};
use crate::handle::{BlockHandle, FunctionRef, TableRef};
use crate::native_fn::NativeFn;
use crate::value::{Value, ValueKind};

/// A dynamically typed, stack based execution context.
///
/// Frame positions are 1-based and relative to the current call frame.
pub trait Runtime {
    // === Frame access ===

    /// Number of cells in the current frame.
    fn frame_size(&self) -> usize;

    /// Cell at a 1-based frame position, or `None` past the end of the frame.
    fn value_at(&self, position: usize) -> Option<&Value>;

    /// Push a value on top of the current frame.
    fn push(&mut self, value: Value);

    // === Blocks ===

    fn blocks(&self) -> &BlockArena;

    fn blocks_mut(&mut self) -> &mut BlockArena;

    // === Tables ===

    /// Create an empty table with no metatable.
    fn new_table(&mut self) -> TableRef;

    /// Read a string-keyed field without consulting metatables.
    fn raw_get(&self, table: TableRef, key: &str) -> Value;

    /// Write a string-keyed field without consulting metatables.
    /// Writing nil removes the field.
    fn raw_set(&mut self, table: TableRef, key: &str, value: Value);

    fn set_metatable(&mut self, table: TableRef, metatable: Option<TableRef>);

    fn metatable(&self, table: TableRef) -> Option<TableRef>;

    // === Environment ===

    fn get_global(&self, name: &str) -> Value;

    fn set_global(&mut self, name: &str, value: Value);

    /// The runtime's private registry table. Anything stored here stays
    /// reachable for the lifetime of the runtime.
    fn registry_table(&self) -> TableRef;

    /// Make a native callable available as a runtime function value.
    fn register_native_callable(&mut self, function: NativeFn) -> FunctionRef;

    // === Provided: predicates ===

    /// Runtime tag of the cell at `position`; positions past the frame read as nil.
    fn kind_at(&self, position: usize) -> ValueKind {
        self.value_at(position)
            .map(Value::kind)
            .unwrap_or(ValueKind::Nil)
    }

    fn is_nil(&self, position: usize) -> bool {
        self.kind_at(position) == ValueKind::Nil
    }

    fn is_integer(&self, position: usize) -> bool {
        self.kind_at(position) == ValueKind::Integer
    }

    /// True for integers and floats alike.
    fn is_number(&self, position: usize) -> bool {
        matches!(self.kind_at(position), ValueKind::Integer | ValueKind::Number)
    }

    fn is_bool(&self, position: usize) -> bool {
        self.kind_at(position) == ValueKind::Bool
    }

    fn is_string(&self, position: usize) -> bool {
        self.kind_at(position) == ValueKind::String
    }

    fn is_opaque_or_light_block(&self, position: usize) -> bool {
        matches!(
            self.kind_at(position),
            ValueKind::Block | ValueKind::LightBlock
        )
    }

    fn is_table(&self, position: usize) -> bool {
        self.kind_at(position) == ValueKind::Table
    }

    // === Provided: validated reads ===

    /// Read an integer-tagged cell. Floats are not accepted.
    fn read_integer(&self, position: usize) -> Result<i64, ConversionError> {
        match self.value_at(position) {
            Some(Value::Integer(v)) => Ok(*v),
            _ => Err(ConversionError::mismatch(
                "integer",
                self.kind_at(position).name(),
            )),
        }
    }

    /// Read a float or integer cell as f64. Numeric strings are not accepted.
    fn read_float(&self, position: usize) -> Result<f64, ConversionError> {
        match self.value_at(position) {
            Some(Value::Number(v)) => Ok(*v),
            Some(Value::Integer(v)) => Ok(*v as f64),
            _ => Err(ConversionError::mismatch(
                "number",
                self.kind_at(position).name(),
            )),
        }
    }

    fn read_bool(&self, position: usize) -> Result<bool, ConversionError> {
        match self.value_at(position) {
            Some(Value::Bool(v)) => Ok(*v),
            _ => Err(ConversionError::mismatch(
                "boolean",
                self.kind_at(position).name(),
            )),
        }
    }

    /// Borrow a string cell. The view is valid while the frame is untouched.
    fn read_str(&self, position: usize) -> Result<&str, ConversionError> {
        match self.value_at(position) {
            Some(Value::String(s)) => Ok(s),
            _ => Err(ConversionError::mismatch(
                "string",
                self.kind_at(position).name(),
            )),
        }
    }

    /// Read a heavy or light block handle.
    fn read_block(&self, position: usize) -> Result<BlockHandle, ConversionError> {
        match self.value_at(position) {
            Some(Value::Block(h)) | Some(Value::LightBlock(h)) => Ok(*h),
            _ => Err(ConversionError::mismatch(
                "userdata",
                self.kind_at(position).name(),
            )),
        }
    }

    fn read_table(&self, position: usize) -> Result<TableRef, ConversionError> {
        match self.value_at(position) {
            Some(Value::Table(t)) => Ok(*t),
            _ => Err(ConversionError::mismatch(
                "table",
                self.kind_at(position).name(),
            )),
        }
    }

    // === Provided: pushes ===

    fn push_nil(&mut self) {
        self.push(Value::Nil);
    }

    fn push_integer(&mut self, value: i64) {
        self.push(Value::Integer(value));
    }

    fn push_float(&mut self, value: f64) {
        self.push(Value::Number(value));
    }

    fn push_bool(&mut self, value: bool) {
        self.push(Value::Bool(value));
    }

    fn push_string(&mut self, value: &str) {
        self.push(Value::string(value));
    }

    fn push_block(&mut self, handle: BlockHandle) {
        self.push(Value::Block(handle));
    }

    fn push_light_block(&mut self, handle: BlockHandle) {
        self.push(Value::LightBlock(handle));
    }

    fn push_table(&mut self, table: TableRef) {
        self.push(Value::Table(table));
    }

    // === Provided: block management ===

    /// Allocate an uninitialized block and push it as an owning reference.
    fn allocate_block(&mut self) -> BlockHandle {
        let handle = self.blocks_mut().allocate();
        self.push(Value::Block(handle));
        handle
    }

    /// Attach the behavior table (metatable) of a block.
    fn set_behavior_table(
        &mut self,
        handle: BlockHandle,
        table: TableRef,
    ) -> Result<(), BlockError> {
        self.blocks_mut().set_behavior(handle, table)
    }

    fn behavior_table(&self, handle: BlockHandle) -> Option<TableRef> {
        self.blocks().behavior(handle)
    }
}
