//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use stackbind::{NativeClass, Value};
use stackbind_vm::{Vm, VmConfig, VmError};

/// Install a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A runtime that only collects when asked.
pub fn vm() -> Vm {
    init_tracing();
    Vm::with_config(VmConfig::default().with_gc_pause(None))
}

/// Counts how often values are dropped.
#[derive(Debug, Clone, Default)]
pub struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A bound class whose destructor is observable.
#[derive(Debug)]
pub struct Probe {
    pub id: i64,
    drops: DropCounter,
}

impl Probe {
    pub fn new(id: i64, drops: &DropCounter) -> Self {
        Self {
            id,
            drops: drops.clone(),
        }
    }
}

impl NativeClass for Probe {
    const NAME: &'static str = "Probe";
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.drops.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Call a global and expect exactly one result.
pub fn call1(vm: &mut Vm, name: &str, args: &[Value]) -> Result<Value, VmError> {
    let mut out = vm.call_global(name, args)?;
    assert_eq!(out.len(), 1, "{name} returned {out:?}");
    Ok(out.remove(0))
}
