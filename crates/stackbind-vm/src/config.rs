//! Runtime configuration.

/// Configuration of a [`Vm`](crate::Vm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of nested native calls.
    pub max_call_depth: usize,
    /// Collect garbage automatically once this many heap objects (tables,
    /// functions, blocks) have been created since the last collection.
    /// Checked only when a top-level call starts. `None` disables automatic
    /// collection.
    pub gc_pause: Option<usize>,
}

impl VmConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_gc_pause(mut self, pause: Option<usize>) -> Self {
        self.gc_pause = pause;
        self
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
            gc_pause: Some(1024),
        }
    }
}
