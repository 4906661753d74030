use reducebench_runtime::OperationError;
use thiserror::Error;

/// Errors raised while configuring or launching a reduction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// Nothing to reduce.
    #[error("Can't reduce an empty input")]
    EmptyInput,

    /// The tree fold halves the active units at every step.
    #[error("The cube dim must be a power of two, got {cube_dim}")]
    NotPowerOfTwo {
        /// Requested units per cube.
        cube_dim: u32,
    },

    /// Every cube reduces a full slice.
    #[error("The cube dim {cube_dim} doesn't evenly divide the input length {len}")]
    UnevenCubes {
        /// Input length.
        len: usize,
        /// Requested units per cube.
        cube_dim: u32,
    },

    /// The device can't run cubes that large.
    #[error("The cube dim {cube_dim} exceeds the device limit of {max} units per cube")]
    CubeDimTooLarge {
        /// Requested units per cube.
        cube_dim: u32,
        /// Units per cube supported by the device.
        max: u32,
    },

    /// The device can't give each cube enough shared memory.
    #[error("A cube of {cube_dim} units needs {requested} bytes of shared memory, the device has {max}")]
    SharedMemoryTooLarge {
        /// Requested units per cube.
        cube_dim: u32,
        /// Shared memory needed, in bytes.
        requested: usize,
        /// Shared memory available, in bytes.
        max: usize,
    },

    /// The input doesn't fit the dispatch limits.
    #[error("The input length {len} exceeds the maximum of {max} elements")]
    InputTooLarge {
        /// Input length.
        len: usize,
        /// Maximum length.
        max: usize,
    },

    /// A buffer doesn't have the size the reduction expects.
    #[error("The {name} buffer holds {actual} bytes, {expected} expected")]
    BufferSize {
        /// Which buffer.
        name: &'static str,
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// The partial-sums buffer is shared with another owner.
    #[error("The partial-sums buffer is still referenced elsewhere")]
    PartialsInUse,

    /// An accelerator operation failed.
    #[error(transparent)]
    Launch(#[from] OperationError),
}
