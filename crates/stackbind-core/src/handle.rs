//! Generational handles to runtime-managed objects.
//!
//! Handles are plain copyable indices. The generation changes every time a
//! slot is reused, so a handle that outlives its object is detected as
//! stale instead of silently aliasing a newer object.

/// Handle to a native block in a [`BlockArena`](crate::BlockArena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle {
    /// Index into the arena's slots
    pub index: u32,
    /// Generation for use-after-free detection
    pub generation: u32,
}

impl BlockHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Handle to a runtime table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub index: u32,
    pub generation: u32,
}

impl TableRef {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Handle to a runtime callable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionRef {
    pub index: u32,
    pub generation: u32,
}

impl FunctionRef {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}
