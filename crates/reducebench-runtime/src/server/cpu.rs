use core::ops::Range;
use std::{sync::Arc, time::Instant};

use super::{ComputeServer, Handle};
use crate::{
    error::{OperationError, StatusCode},
    kernel::{CubeCount, CubeDim, KernelHandle},
    logging::ServerLogger,
    platform::DeviceProperties,
    scheduler::Scheduler,
    storage::{BufferStorage, DeviceBuffer, MemoryUsage, WORD_SIZE},
};

const LAUNCH: &str = "enqueueNDRangeKernel";

/// Host-emulated device executing kernels on a pool of worker threads.
#[derive(Debug)]
pub struct CpuServer {
    storage: BufferStorage,
    scheduler: Scheduler,
    logger: ServerLogger,
    // First execution error since the last synchronization point.
    pending: Option<OperationError>,
}

impl CpuServer {
    /// Creates a server for a device with the given properties.
    pub fn new(properties: &DeviceProperties, logger: ServerLogger) -> Self {
        Self {
            storage: BufferStorage::new(properties.global_memory_size),
            scheduler: Scheduler::new(properties.num_workers),
            logger,
            pending: None,
        }
    }

    fn defer(&mut self, err: OperationError) {
        log::debug!("Deferring execution error: {err}");
        if self.pending.is_none() {
            self.pending = Some(err);
        }
    }

    fn resolve(&self, bindings: &[Handle]) -> Result<Vec<Arc<DeviceBuffer>>, OperationError> {
        bindings
            .iter()
            .map(|handle| self.storage.get(LAUNCH, handle))
            .collect()
    }
}

impl ComputeServer for CpuServer {
    fn create(&mut self, data: &[u8]) -> Result<Handle, OperationError> {
        self.storage.alloc("enqueueWriteBuffer", data.len(), Some(data))
    }

    fn empty(&mut self, size: usize) -> Result<Handle, OperationError> {
        self.storage.alloc("createBuffer", size, None)
    }

    fn read(&mut self, handle: &Handle, range: Range<usize>) -> Result<Vec<u8>, OperationError> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }

        let operation = "enqueueReadBuffer";
        let buffer = self.storage.get(operation, handle)?;

        if range.start > range.end
            || range.end > buffer.size()
            || range.start % WORD_SIZE != 0
            || range.end % WORD_SIZE != 0
        {
            return Err(OperationError::new(
                operation,
                StatusCode::InvalidValue,
                format!(
                    "range {range:?} isn't a word-aligned range of {} ({} bytes)",
                    handle.id(),
                    buffer.size()
                ),
            ));
        }

        Ok(buffer.read_bytes(range))
    }

    fn execute(
        &mut self,
        kernel: KernelHandle,
        cube_count: CubeCount,
        cube_dim: CubeDim,
        bindings: Vec<Handle>,
    ) {
        if self.pending.is_some() {
            log::debug!("Skipping kernel {} after a failed command", kernel.name());
            return;
        }

        let buffers = match self.resolve(&bindings) {
            Ok(buffers) => buffers,
            Err(err) => return self.defer(err),
        };

        let start = Instant::now();
        let result =
            self.scheduler
                .dispatch_execute(kernel.as_ref(), cube_count, cube_dim, &buffers);
        self.logger.register_profiled(kernel.name(), start.elapsed());

        if let Err(fault) = result {
            self.defer(OperationError::new(
                LAUNCH,
                StatusCode::OutOfResources,
                format!("kernel `{}` faulted on {fault}", kernel.name()),
            ));
        }
    }

    fn flush(&mut self) -> Result<(), OperationError> {
        self.logger.profile_summary();
        self.storage.cleanup();

        match self.pending.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn memory_usage(&mut self) -> MemoryUsage {
        self.storage.cleanup();
        self.storage.usage()
    }
}
