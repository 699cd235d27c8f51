//! Minimal in-crate runtime for unit tests.

use rustc_hash::FxHashMap;

use crate::arena::BlockArena;
use crate::handle::{FunctionRef, TableRef};
use crate::native_fn::NativeFn;
use crate::runtime::Runtime;
use crate::value::Value;

#[derive(Default)]
struct MockTable {
    fields: FxHashMap<String, Value>,
    metatable: Option<TableRef>,
}

/// Single-frame runtime: the whole stack is the current frame.
pub(crate) struct MockRuntime {
    pub stack: Vec<Value>,
    tables: Vec<MockTable>,
    globals: FxHashMap<String, Value>,
    functions: Vec<NativeFn>,
    blocks: BlockArena,
    registry: TableRef,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            tables: vec![MockTable::default()],
            globals: FxHashMap::default(),
            functions: Vec::new(),
            blocks: BlockArena::new(),
            registry: TableRef::new(0, 0),
        }
    }

    pub fn with_args(args: Vec<Value>) -> Self {
        let mut rt = Self::new();
        rt.stack = args;
        rt
    }

    pub fn function(&self, f: FunctionRef) -> &NativeFn {
        &self.functions[f.index as usize]
    }
}

impl Runtime for MockRuntime {
    fn frame_size(&self) -> usize {
        self.stack.len()
    }

    fn value_at(&self, position: usize) -> Option<&Value> {
        position.checked_sub(1).and_then(|i| self.stack.get(i))
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
        self.tables.push(MockTable::default());
        TableRef::new(self.tables.len() as u32 - 1, 0)
    }

    fn raw_get(&self, table: TableRef, key: &str) -> Value {
        self.tables
            .get(table.index as usize)
            .and_then(|t| t.fields.get(key).cloned())
            .unwrap_or_default()
    }

    fn raw_set(&mut self, table: TableRef, key: &str, value: Value) {
        if let Some(t) = self.tables.get_mut(table.index as usize) {
            if value.is_nil() {
                t.fields.remove(key);
            } else {
                t.fields.insert(key.to_string(), value);
            }
        }
    }

    fn set_metatable(&mut self, table: TableRef, metatable: Option<TableRef>) {
        if let Some(t) = self.tables.get_mut(table.index as usize) {
            t.metatable = metatable;
        }
    }

    fn metatable(&self, table: TableRef) -> Option<TableRef> {
        self.tables
            .get(table.index as usize)
            .and_then(|t| t.metatable)
    }

    fn get_global(&self, name: &str) -> Value {
        self.globals.get(name).cloned().unwrap_or_default()
    }

    fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    fn registry_table(&self) -> TableRef {
        self.registry
    }

    fn register_native_callable(&mut self, function: NativeFn) -> FunctionRef {
        self.functions.push(function);
        FunctionRef::new(self.functions.len() as u32 - 1, 0)
    }
}
