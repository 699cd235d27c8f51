//! Object construction and finalization.
//!
//! A bound object lives in a block of the runtime's arena. Construction
//! allocates the block, tags it with the class prototype and only then
//! moves the value in, so a block the collector sees always has its
//! finalizer attached. Finalization destroys the value of a live block and
//! is a no-op for anything else.

use stackbind_core::{
    BlockHandle, Lifecycle, NativeClass, NativeError, Runtime, TableRef, Value,
};

/// What a finalizer call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The block was live; its native value has been dropped.
    Finalized,
    /// The block had already been finalized.
    AlreadyFinalized,
    /// The block never received a value (its constructor did not finish).
    NotConstructed,
    /// The receiver is not a block of this runtime: a table such as a
    /// prototype, a light block, a stale handle or any other value.
    InvalidHandle,
}

impl FinalizeOutcome {
    /// True if a destructor ran.
    pub fn ran(self) -> bool {
        self == FinalizeOutcome::Finalized
    }
}

/// Allocate a block tagged with `prototype`, leaving it uninitialized on
/// top of the stack.
pub fn allocate_tagged(
    rt: &mut dyn Runtime,
    prototype: TableRef,
) -> Result<BlockHandle, NativeError> {
    let handle = rt.allocate_block();
    rt.set_behavior_table(handle, prototype)?;
    Ok(handle)
}

/// Move `value` into an uninitialized block, making it live.
pub fn construct<T: NativeClass>(
    rt: &mut dyn Runtime,
    handle: BlockHandle,
    value: T,
) -> Result<(), NativeError> {
    rt.blocks_mut().construct(handle, value)?;
    tracing::trace!(class = T::NAME, ?handle, "object constructed");
    Ok(())
}

/// Finalize the object at frame position 1.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn finalize(rt: &mut dyn Runtime) -> FinalizeOutcome {
    let handle = match rt.value_at(1) {
        Some(Value::Block(handle)) => *handle,
        other => {
            let receiver = other.map(Value::type_name).unwrap_or("no value");
            tracing::warn!(receiver, "finalizer called on a non-block value");
            return FinalizeOutcome::InvalidHandle;
        }
    };
    let type_name = rt.blocks().type_name(handle).unwrap_or("unknown");
    let outcome = match rt.blocks_mut().destroy(handle) {
        Ok(Lifecycle::Live) => FinalizeOutcome::Finalized,
        Ok(Lifecycle::Finalized) => FinalizeOutcome::AlreadyFinalized,
        Ok(Lifecycle::Uninitialized) => FinalizeOutcome::NotConstructed,
        Err(err) => {
            tracing::warn!(?handle, error = %err, "finalizer called on an invalid handle");
            return FinalizeOutcome::InvalidHandle;
        }
    };
    tracing::trace!(?handle, type_name, ?outcome, "finalize");
    outcome
}
