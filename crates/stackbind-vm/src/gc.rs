//! Mark-and-sweep collector.
//!
//! Roots are the globals table, the registry table and every stack cell.
//! Tables keep their keys, values and metatable alive; heavy blocks keep
//! their behavior table alive; light blocks keep nothing alive.
//!
//! Unreachable objects with a finalizer are finalized before anything is
//! freed, so finalizers may still touch other garbage:
//!
//! - a block is finalized by the `__gc` field of its behavior table
//! - a table is finalized by the `__gc` field of its metatable
//!
//! Finalizers receive the object as their only argument. Errors raised by a
//! finalizer are logged and otherwise ignored.

use rustc_hash::FxHashSet;
use stackbind_core::{BlockHandle, FunctionRef, Runtime, TableRef, Value};

use crate::vm::Vm;

/// What one collection cycle did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    pub tables_freed: usize,
    pub functions_freed: usize,
    pub blocks_freed: usize,
    pub finalizers_run: usize,
}

#[derive(Default)]
struct Marks {
    tables: FxHashSet<TableRef>,
    functions: FxHashSet<FunctionRef>,
    blocks: FxHashSet<BlockHandle>,
}

impl Vm {
    /// Run a full collection cycle.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collect_garbage(&mut self) -> GcStats {
        self.allocations = 0;
        self.collecting = true;
        let marks = self.mark();

        let dead_tables: Vec<TableRef> = self
            .tables
            .keys()
            .map(|(i, g)| TableRef::new(i, g))
            .filter(|t| !marks.tables.contains(t))
            .collect();
        let dead_functions: Vec<FunctionRef> = self
            .functions
            .keys()
            .map(|(i, g)| FunctionRef::new(i, g))
            .filter(|f| !marks.functions.contains(f))
            .collect();
        let dead_blocks: Vec<BlockHandle> = self
            .blocks
            .handles()
            .filter(|h| !marks.blocks.contains(h))
            .collect();

        let mut stats = GcStats::default();

        for &handle in &dead_blocks {
            let finalizer = self
                .blocks
                .behavior(handle)
                .map(|behavior| self.raw_get(behavior, "__gc"));
            if let Some(finalizer @ Value::Function(_)) = finalizer {
                self.run_finalizer(&finalizer, Value::Block(handle));
                stats.finalizers_run += 1;
            }
        }
        for &table in &dead_tables {
            let finalizer = self
                .metatable(table)
                .map(|meta| self.raw_get(meta, "__gc"));
            if let Some(finalizer @ Value::Function(_)) = finalizer {
                self.run_finalizer(&finalizer, Value::Table(table));
                stats.finalizers_run += 1;
            }
        }

        for handle in dead_blocks {
            if self.blocks.free(handle) {
                stats.blocks_freed += 1;
            }
        }
        for table in dead_tables {
            if self.tables.remove(table.index, table.generation).is_some() {
                stats.tables_freed += 1;
            }
        }
        for function in dead_functions {
            if self
                .functions
                .remove(function.index, function.generation)
                .is_some()
            {
                stats.functions_freed += 1;
            }
        }

        self.collecting = false;
        tracing::trace!(
            tables = stats.tables_freed,
            functions = stats.functions_freed,
            blocks = stats.blocks_freed,
            finalizers = stats.finalizers_run,
            "garbage collected"
        );
        stats
    }

    fn run_finalizer(&mut self, finalizer: &Value, object: Value) {
        if let Err(err) = self.call(finalizer, std::slice::from_ref(&object)) {
            tracing::warn!(?object, error = %err, "finalizer failed");
        }
    }

    fn mark(&self) -> Marks {
        let mut marks = Marks::default();
        let mut pending: Vec<Value> = self.stack.clone();
        pending.push(Value::Table(self.globals));
        pending.push(Value::Table(self.registry));

        while let Some(value) = pending.pop() {
            match value {
                Value::Table(t) => {
                    if !marks.tables.insert(t) {
                        continue;
                    }
                    if let Some(table) = self.table(t) {
                        pending.extend(table.references());
                    }
                }
                Value::Function(f) => {
                    marks.functions.insert(f);
                }
                Value::Block(h) => {
                    if !marks.blocks.insert(h) {
                        continue;
                    }
                    if let Some(behavior) = self.blocks.behavior(h) {
                        pending.push(Value::Table(behavior));
                    }
                }
                _ => {}
            }
        }
        marks
    }
}
