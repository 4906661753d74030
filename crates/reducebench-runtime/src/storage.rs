use core::ops::Range;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;

use crate::{
    error::{OperationError, StatusCode},
    server::Handle,
    BufferId,
};

/// Size in bytes of one addressable device word.
pub const WORD_SIZE: usize = core::mem::size_of::<u32>();

/// Word-addressed device memory.
///
/// Every slot is one 32-bit element that any cube may load or store concurrently. No ordering is
/// guaranteed between cubes; ordering is only established by dispatch boundaries.
#[derive(Debug)]
pub struct DeviceBuffer {
    words: Box<[AtomicU32]>,
}

impl DeviceBuffer {
    /// Allocates a zero-initialized buffer of `len` words.
    pub fn zeroed(len: usize) -> Self {
        Self {
            words: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Copies host bytes into a new buffer. The length must be a multiple of [WORD_SIZE].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len() % WORD_SIZE, 0);

        Self {
            words: bytes
                .chunks_exact(WORD_SIZE)
                .map(|chunk| AtomicU32::new(bytemuck::pod_read_unaligned(chunk)))
                .collect(),
        }
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the buffer holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.words.len() * WORD_SIZE
    }

    /// Loads the element at `index`, `None` when out of bounds.
    pub fn load(&self, index: usize) -> Option<f32> {
        self.words
            .get(index)
            .map(|word| f32::from_bits(word.load(Ordering::Relaxed)))
    }

    /// Stores `value` at `index`, returns false when out of bounds.
    pub fn store(&self, index: usize, value: f32) -> bool {
        match self.words.get(index) {
            Some(word) => {
                word.store(value.to_bits(), Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Copies a word-aligned byte range back to the host.
    pub fn read_bytes(&self, range: Range<usize>) -> Vec<u8> {
        let words = self.words[range.start / WORD_SIZE..range.end / WORD_SIZE]
            .iter()
            .map(|word| word.load(Ordering::Relaxed))
            .collect::<Vec<u32>>();

        bytemuck::cast_slice(&words).to_vec()
    }
}

/// Reinterprets host bytes read from a device as elements, ignoring trailing bytes.
pub fn from_bytes<E: bytemuck::Pod>(bytes: &[u8]) -> Vec<E> {
    bytes
        .chunks_exact(core::mem::size_of::<E>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

/// Memory usage of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Number of live allocations.
    pub number_allocs: usize,
    /// Bytes held by live allocations.
    pub bytes_in_use: usize,
}

impl core::fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} allocation(s), {} byte(s) in use",
            self.number_allocs, self.bytes_in_use
        )
    }
}

#[derive(Debug)]
struct StorageEntry {
    buffer: Arc<DeviceBuffer>,
    // Shared with every client-side handle, the entry is reclaimable once it's the last owner.
    guard: Arc<()>,
}

/// Buffer storage of a device, bounded by its global memory size.
#[derive(Debug)]
pub struct BufferStorage {
    entries: HashMap<BufferId, StorageEntry>,
    global_memory_size: usize,
}

impl BufferStorage {
    /// Creates an empty storage able to hold `global_memory_size` bytes.
    pub fn new(global_memory_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            global_memory_size,
        }
    }

    /// Allocates a buffer, optionally initialized from host bytes.
    ///
    /// The size must be non-zero and a multiple of [WORD_SIZE].
    pub fn alloc(
        &mut self,
        operation: &'static str,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<Handle, OperationError> {
        if size == 0 || size % WORD_SIZE != 0 {
            return Err(OperationError::new(
                operation,
                StatusCode::InvalidBufferSize,
                format!("buffer size must be a non-zero multiple of {WORD_SIZE} bytes, got {size}"),
            ));
        }

        self.cleanup();

        let usage = self.usage();
        if usage.bytes_in_use + size > self.global_memory_size {
            return Err(OperationError::new(
                operation,
                StatusCode::MemObjectAllocationFailure,
                format!(
                    "requested {size} bytes with {} of {} bytes already in use",
                    usage.bytes_in_use, self.global_memory_size
                ),
            ));
        }

        let buffer = match data {
            Some(bytes) => DeviceBuffer::from_bytes(bytes),
            None => DeviceBuffer::zeroed(size / WORD_SIZE),
        };
        let id = BufferId::new();
        let guard = Arc::new(());

        log::debug!("Allocated {id} with {size} bytes");
        self.entries.insert(
            id,
            StorageEntry {
                buffer: Arc::new(buffer),
                guard: guard.clone(),
            },
        );

        Ok(Handle::new(id, size, guard))
    }

    /// Resolves the buffer behind a handle.
    pub fn get(
        &self,
        operation: &'static str,
        handle: &Handle,
    ) -> Result<Arc<DeviceBuffer>, OperationError> {
        self.entries
            .get(&handle.id())
            .map(|entry| entry.buffer.clone())
            .ok_or_else(|| {
                OperationError::new(
                    operation,
                    StatusCode::InvalidMemObject,
                    format!("{} isn't allocated on this device", handle.id()),
                )
            })
    }

    /// Releases every buffer no handle refers to anymore, returns how many were released.
    pub fn cleanup(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, entry| {
            let alive = Arc::strong_count(&entry.guard) > 1;
            if !alive {
                log::debug!("Released {id}");
            }
            alive
        });
        before - self.entries.len()
    }

    /// Current memory usage.
    pub fn usage(&self) -> MemoryUsage {
        MemoryUsage {
            number_allocs: self.entries.len(),
            bytes_in_use: self.entries.values().map(|entry| entry.buffer.size()).sum(),
        }
    }
}
