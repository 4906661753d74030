use core::ops::Range;
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use reducebench_runtime::{
    kernel::{CubeCount, CubeDim, KernelHandle},
    server::{ComputeServer, Handle},
    storage::MemoryUsage,
    BufferId, OperationError, StatusCode,
};

/// Failure injected into a [DummyServer].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Every allocation fails with `MEM_OBJECT_ALLOCATION_FAILURE`.
    Allocation,
    /// Every execution fails with `OUT_OF_RESOURCES`, reported at the next sync point.
    Execution,
    /// The server thread dies on the first execution.
    Crash,
}

/// The dummy server is used to test the runtime infrastructure.
///
/// It stores buffers as plain bytes and doesn't run kernels: executions are only recorded.
#[derive(Debug, Default)]
pub struct DummyServer {
    buffers: HashMap<BufferId, (Vec<u8>, Arc<()>)>,
    launched: Arc<Mutex<Vec<String>>>,
    failure: Option<Failure>,
    pending: Option<OperationError>,
}

impl DummyServer {
    /// A server failing as described by `failure`.
    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    /// Names of the executed kernels, shared with the server thread.
    pub fn launched(&self) -> Arc<Mutex<Vec<String>>> {
        self.launched.clone()
    }

    fn alloc(&mut self, operation: &'static str, data: Vec<u8>) -> Result<Handle, OperationError> {
        if self.failure == Some(Failure::Allocation) {
            return Err(OperationError::new(
                operation,
                StatusCode::MemObjectAllocationFailure,
                "injected allocation failure",
            ));
        }

        let id = BufferId::new();
        let count = Arc::new(());
        let size = data.len();
        self.buffers.insert(id, (data, count.clone()));

        Ok(Handle::new(id, size, count))
    }
}

impl ComputeServer for DummyServer {
    fn create(&mut self, data: &[u8]) -> Result<Handle, OperationError> {
        self.alloc("enqueueWriteBuffer", data.to_vec())
    }

    fn empty(&mut self, size: usize) -> Result<Handle, OperationError> {
        self.alloc("createBuffer", vec![0; size])
    }

    fn read(&mut self, handle: &Handle, range: Range<usize>) -> Result<Vec<u8>, OperationError> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }

        let (bytes, _) = self.buffers.get(&handle.id()).ok_or_else(|| {
            OperationError::new(
                "enqueueReadBuffer",
                StatusCode::InvalidMemObject,
                "unknown buffer",
            )
        })?;

        bytes.get(range).map(|bytes| bytes.to_vec()).ok_or_else(|| {
            OperationError::new("enqueueReadBuffer", StatusCode::InvalidValue, "bad range")
        })
    }

    fn execute(
        &mut self,
        kernel: KernelHandle,
        _cube_count: CubeCount,
        _cube_dim: CubeDim,
        _bindings: Vec<Handle>,
    ) {
        if let Ok(mut launched) = self.launched.lock() {
            launched.push(kernel.name().to_string());
        }

        match self.failure {
            Some(Failure::Execution) if self.pending.is_none() => {
                self.pending = Some(OperationError::new(
                    "enqueueNDRangeKernel",
                    StatusCode::OutOfResources,
                    "injected execution failure",
                ));
            }
            Some(Failure::Crash) => panic!("injected server crash"),
            _ => {}
        }
    }

    fn flush(&mut self) -> Result<(), OperationError> {
        match self.pending.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn memory_usage(&mut self) -> MemoryUsage {
        self.buffers
            .retain(|_, (_, count)| Arc::strong_count(count) > 1);

        MemoryUsage {
            number_allocs: self.buffers.len(),
            bytes_in_use: self.buffers.values().map(|(bytes, _)| bytes.len()).sum(),
        }
    }
}
