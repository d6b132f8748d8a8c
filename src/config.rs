//! The allocator's only tunable knob.

/// Runtime configuration for a [`crate::Heap`].
#[derive(Debug, Clone, Copy)]
pub struct HeapConfig {
    /// Minimum chunk requested from the memory provider on an allocate
    /// miss, in bytes. The reference behavior uses 128.
    pub initial_chunk_bytes: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            initial_chunk_bytes: 128,
        }
    }
}
