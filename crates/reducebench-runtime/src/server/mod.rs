mod cpu;
mod handle;

pub use cpu::*;
pub use handle::*;

use core::ops::Range;

use crate::{
    error::OperationError,
    kernel::{CubeCount, CubeDim, KernelHandle},
    storage::MemoryUsage,
};

/// The compute server is responsible for handling resources and computations over resources.
///
/// Everything in the server is mutable, therefore it should be solely accessed through the
/// [compute channel](crate::channel::MpscComputeChannel) for thread safety. Commands are
/// executed in the order they are received.
pub trait ComputeServer: Send + core::fmt::Debug + 'static {
    /// Given bytes, allocates a buffer holding them (`enqueueWriteBuffer`).
    fn create(&mut self, data: &[u8]) -> Result<Handle, OperationError>;

    /// Allocates a zero-initialized buffer of `size` bytes (`createBuffer`).
    fn empty(&mut self, size: usize) -> Result<Handle, OperationError>;

    /// Copies a byte range of a buffer back to the host (`enqueueReadBuffer`).
    ///
    /// A deferred execution error pending on the queue is returned instead of the data.
    fn read(&mut self, handle: &Handle, range: Range<usize>) -> Result<Vec<u8>, OperationError>;

    /// Executes a kernel over the given buffers.
    ///
    /// Errors are deferred and reported at the next [read](ComputeServer::read) or
    /// [flush](ComputeServer::flush).
    fn execute(
        &mut self,
        kernel: KernelHandle,
        cube_count: CubeCount,
        cube_dim: CubeDim,
        bindings: Vec<Handle>,
    );

    /// Waits for every queued command, returning the first deferred execution error.
    fn flush(&mut self) -> Result<(), OperationError>;

    /// The current memory usage of the server.
    fn memory_usage(&mut self) -> MemoryUsage;
}
