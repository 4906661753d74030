use core::sync::atomic::{AtomicU64, Ordering};

static NEXT_BUFFER: AtomicU64 = AtomicU64::new(0);

/// Identifies a buffer allocated on a device. Ids are never reused within a process.
#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Takes the next id.
    pub fn new() -> Self {
        Self(NEXT_BUFFER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for BufferId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for BufferId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}
