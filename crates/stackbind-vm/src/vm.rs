//! The reference runtime: value stack, heap and call API.

use std::panic::{AssertUnwindSafe, catch_unwind};

use stackbind_core::{
    BlockArena, BlockHandle, FunctionRef, NativeError, NativeFn, Runtime, TableRef, Value,
};

use crate::config::VmConfig;
use crate::error::VmError;
use crate::slab::Slab;
use crate::table::Table;

/// Longest `__index` chain followed before giving up.
const MAX_INDEX_CHAIN: usize = 100;

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Stack index of frame position 1
    base: usize,
}

/// A minimal stack based runtime.
///
/// There is no parser; code runs by calling function values through
/// [`call`](Vm::call), [`call_global`](Vm::call_global),
/// [`call_path`](Vm::call_path) and [`call_method`](Vm::call_method).
///
/// Values held only by the host (for example a result returned from
/// `call`) are not garbage collection roots. Anchor them with
/// [`set_global`](Runtime::set_global) or pass them back as call arguments
/// before collecting.
pub struct Vm {
    pub(crate) stack: Vec<Value>,
    frames: Vec<Frame>,
    pub(crate) tables: Slab<Table>,
    pub(crate) functions: Slab<NativeFn>,
    pub(crate) blocks: BlockArena,
    pub(crate) globals: TableRef,
    pub(crate) registry: TableRef,
    config: VmConfig,
    pub(crate) allocations: usize,
    pub(crate) collecting: bool,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        let mut tables = Slab::new();
        let (gi, gg) = tables.insert(Table::new());
        let (ri, rg) = tables.insert(Table::new());
        Self {
            stack: Vec::new(),
            frames: Vec::new(),
            tables,
            functions: Slab::new(),
            blocks: BlockArena::new(),
            globals: TableRef::new(gi, gg),
            registry: TableRef::new(ri, rg),
            config,
            allocations: 0,
            collecting: false,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// The table holding global variables.
    pub fn globals_table(&self) -> TableRef {
        self.globals
    }

    pub fn table(&self, table: TableRef) -> Option<&Table> {
        self.tables.get(table.index, table.generation)
    }

    pub fn table_mut(&mut self, table: TableRef) -> Option<&mut Table> {
        self.tables.get_mut(table.index, table.generation)
    }

    pub fn function(&self, function: FunctionRef) -> Option<&NativeFn> {
        self.functions.get(function.index, function.generation)
    }

    /// Total number of stack cells across all frames.
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Number of active native calls.
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of live tables, including the globals and registry tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Wrap a native function as a callable value.
    pub fn create_function(&mut self, function: NativeFn) -> Value {
        Value::Function(self.register_native_callable(function))
    }

    /// Create a table value.
    pub fn create_table(&mut self) -> Value {
        Value::Table(self.new_table())
    }

    // === Calls ===

    /// Call a function value with `args`, returning its results.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&mut self, callee: &Value, args: &[Value]) -> Result<Vec<Value>, VmError> {
        let function = match callee {
            Value::Function(f) => *f,
            other => {
                return Err(VmError::NotCallable {
                    type_name: other.type_name(),
                });
            }
        };
        let native = self
            .function(function)
            .cloned()
            .ok_or(VmError::StaleReference { kind: "function" })?;
        if self.frames.len() >= self.config.max_call_depth {
            return Err(VmError::StackOverflow {
                limit: self.config.max_call_depth,
            });
        }

        let base = self.stack.len();
        self.stack.extend_from_slice(args);
        if self.frames.is_empty() {
            // Arguments are on the stack now, so they survive the collection.
            self.maybe_collect();
        }

        tracing::trace!(function = native.name(), args = args.len(), "call");
        self.frames.push(Frame { base });
        let outcome = catch_unwind(AssertUnwindSafe(|| native.call(self)));
        self.frames.pop();

        let result = match outcome {
            Ok(Ok(count)) => {
                // Only cells pushed above the arguments count as results.
                let available = self.stack.len().saturating_sub(base + args.len());
                let start = self.stack.len() - count.min(available);
                Ok(self.stack.split_off(start))
            }
            Ok(Err(err)) => {
                tracing::trace!(function = native.name(), error = %err, "native call failed");
                Err(VmError::Native(err))
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(VmError::Native(NativeError::Panic { message }))
            }
        };
        self.stack.truncate(base);
        result
    }

    /// Call the global function `name`.
    pub fn call_global(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>, VmError> {
        let callee = self.get_global(name);
        self.call(&callee, args)
    }

    /// Call the function at a dotted path such as `geo.Point.new`.
    pub fn call_path(&mut self, path: &str, args: &[Value]) -> Result<Vec<Value>, VmError> {
        let callee = self.get_path(path)?;
        self.call(&callee, args)
    }

    /// Method call syntax: look `name` up on `receiver` through `__index`
    /// and call it with the receiver as the first argument.
    pub fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>, VmError> {
        let method = self.index(receiver, name)?;
        if method.is_nil() {
            return Err(VmError::MissingMethod {
                name: name.to_string(),
                type_name: receiver.type_name(),
            });
        }
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(receiver.clone());
        full.extend_from_slice(args);
        self.call(&method, &full)
    }

    // === Lookup ===

    /// Field access with `__index` fallback.
    ///
    /// Tables are read raw first; blocks have no fields of their own and go
    /// straight to their behavior table. A missing field continues with the
    /// metatable's `__index` table, repeatedly.
    pub fn index(&self, object: &Value, key: &str) -> Result<Value, VmError> {
        let mut current = object.clone();
        for _ in 0..MAX_INDEX_CHAIN {
            let metatable = match &current {
                Value::Table(t) => {
                    let table = self
                        .table(*t)
                        .ok_or(VmError::StaleReference { kind: "table" })?;
                    let value = table.get_str(key);
                    if !value.is_nil() {
                        return Ok(value);
                    }
                    table.metatable()
                }
                Value::Block(h) | Value::LightBlock(h) => match self.blocks.behavior(*h) {
                    Some(behavior) => Some(behavior),
                    None => {
                        return Err(VmError::IndexNonTable {
                            type_name: current.type_name(),
                        });
                    }
                },
                other => {
                    return Err(VmError::IndexNonTable {
                        type_name: other.type_name(),
                    });
                }
            };
            let Some(metatable) = metatable else {
                return Ok(Value::Nil);
            };
            let handler = self.raw_get(metatable, "__index");
            match handler {
                Value::Nil => return Ok(Value::Nil),
                next @ Value::Table(_) => current = next,
                other => {
                    return Err(VmError::IndexNonTable {
                        type_name: other.type_name(),
                    });
                }
            }
        }
        Err(VmError::IndexLoop)
    }

    /// Resolve a dotted path starting from the globals.
    pub fn get_path(&self, path: &str) -> Result<Value, VmError> {
        let mut parts = path.split('.');
        let first = parts.next().unwrap_or_default();
        let mut value = self.get_global(first);
        for part in parts {
            value = self.index(&value, part)?;
        }
        Ok(value)
    }

    pub(crate) fn alloc_table(&mut self, table: Table) -> TableRef {
        self.allocations += 1;
        let (index, generation) = self.tables.insert(table);
        TableRef::new(index, generation)
    }

    fn maybe_collect(&mut self) {
        if !self.collecting
            && self
                .config
                .gc_pause
                .is_some_and(|pause| self.allocations >= pause)
        {
            self.collect_garbage();
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("stack_len", &self.stack.len())
            .field("call_depth", &self.frames.len())
            .field("tables", &self.tables.len())
            .field("functions", &self.functions.len())
            .field("blocks", &self.blocks)
            .finish()
    }
}

impl Runtime for Vm {
    fn frame_size(&self) -> usize {
        let base = self.frames.last().map(|f| f.base).unwrap_or(0);
        self.stack.len() - base
    }

    fn value_at(&self, position: usize) -> Option<&Value> {
        if position == 0 || position > self.frame_size() {
            return None;
        }
        let base = self.frames.last().map(|f| f.base).unwrap_or(0);
        self.stack.get(base + position - 1)
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn blocks(&self) -> &BlockArena {
        &self.blocks
    }

    fn blocks_mut(&mut self) -> &mut BlockArena {
        &mut self.blocks
    }

    fn new_table(&mut self) -> TableRef {
        self.alloc_table(Table::new())
    }

    fn raw_get(&self, table: TableRef, key: &str) -> Value {
        self.table(table)
            .map(|t| t.get_str(key))
            .unwrap_or_default()
    }

    fn raw_set(&mut self, table: TableRef, key: &str, value: Value) {
        match self.table_mut(table) {
            Some(t) => t.set_str(key, value),
            None => tracing::warn!(?table, key, "raw_set on stale table"),
        }
    }

    fn set_metatable(&mut self, table: TableRef, metatable: Option<TableRef>) {
        if let Some(t) = self.table_mut(table) {
            t.set_metatable(metatable);
        }
    }

    fn metatable(&self, table: TableRef) -> Option<TableRef> {
        self.table(table).and_then(Table::metatable)
    }

    fn get_global(&self, name: &str) -> Value {
        self.raw_get(self.globals, name)
    }

    fn set_global(&mut self, name: &str, value: Value) {
        let globals = self.globals;
        self.raw_set(globals, name, value);
    }

    fn registry_table(&self) -> TableRef {
        self.registry
    }

    fn register_native_callable(&mut self, function: NativeFn) -> FunctionRef {
        self.allocations += 1;
        let (index, generation) = self.functions.insert(function);
        FunctionRef::new(index, generation)
    }

    fn allocate_block(&mut self) -> BlockHandle {
        self.allocations += 1;
        let handle = self.blocks.allocate();
        self.push(Value::Block(handle));
        handle
    }
}
