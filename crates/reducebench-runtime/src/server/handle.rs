use std::sync::Arc;

use crate::BufferId;

/// Client-side reference to a device buffer.
///
/// Handles are reference counted: the device reclaims the buffer once every clone is dropped.
#[derive(Clone, Debug)]
pub struct Handle {
    id: BufferId,
    size: usize,
    count: Arc<()>,
}

impl Handle {
    /// Creates a handle sharing the allocation guard of a storage entry.
    pub fn new(id: BufferId, size: usize, count: Arc<()>) -> Self {
        Self { id, size, count }
    }

    /// The id of the buffer.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Size of the buffer in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this handle is the only client-side reference left to the buffer.
    pub fn can_mut(&self) -> bool {
        // The storage always holds one reference.
        Arc::strong_count(&self.count) <= 2
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handle {}
