use std::sync::Arc;

use crate::{
    channel::MpscComputeChannel,
    error::OperationError,
    kernel::{CubeCount, CubeDim, KernelHandle},
    platform::DeviceProperties,
    server::{ComputeServer, Handle},
    storage::{self, MemoryUsage},
    validation,
};

/// The ComputeClient is the entry point to require tasks from the ComputeServer.
///
/// Every command goes through the same in-order queue: a kernel observes every write enqueued
/// before it, and a read observes every kernel enqueued before it.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    channel: MpscComputeChannel,
    properties: Arc<DeviceProperties>,
}

impl ComputeClient {
    /// Create a new client with a new server.
    pub fn new<Server: ComputeServer>(
        server: Server,
        properties: DeviceProperties,
    ) -> Result<Self, OperationError> {
        Ok(Self {
            channel: MpscComputeChannel::new(server)?,
            properties: Arc::new(properties),
        })
    }

    /// Properties of the device served by this client.
    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    /// Returns a resource handle containing the given bytes.
    pub fn create(&self, data: &[u8]) -> Result<Handle, OperationError> {
        self.channel.create(data.to_vec())
    }

    /// Returns a resource handle containing the given elements.
    pub fn create_from_slice<E: bytemuck::Pod>(&self, data: &[E]) -> Result<Handle, OperationError> {
        self.create(bytemuck::cast_slice(data))
    }

    /// Reserves `size` bytes in the storage, and returns a handle over them.
    pub fn empty(&self, size: usize) -> Result<Handle, OperationError> {
        self.channel.empty(size)
    }

    /// Given a handle, returns the whole buffer as bytes.
    pub fn read(&self, handle: &Handle) -> Result<Vec<u8>, OperationError> {
        self.channel.read(handle.clone(), 0..handle.size())
    }

    /// Reads the element at `index` of a buffer.
    pub fn read_one<E: bytemuck::Pod>(
        &self,
        handle: &Handle,
        index: usize,
    ) -> Result<E, OperationError> {
        let size = core::mem::size_of::<E>();
        let start = index.saturating_mul(size);
        let bytes = self
            .channel
            .read(handle.clone(), start..start.saturating_add(size))?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    /// Reads a whole buffer as elements.
    pub fn read_values<E: bytemuck::Pod>(&self, handle: &Handle) -> Result<Vec<E>, OperationError> {
        self.read(handle).map(|bytes| storage::from_bytes(&bytes))
    }

    /// Enqueues a kernel over the given buffers.
    ///
    /// The launch is validated against the device limits first. Execution errors are reported by
    /// the next [read](Self::read) or [flush](Self::flush).
    pub fn launch(
        &self,
        kernel: &KernelHandle,
        cube_count: CubeCount,
        cube_dim: CubeDim,
        bindings: &[&Handle],
    ) -> Result<(), OperationError> {
        validation::validate_launch(
            &self.properties,
            kernel.as_ref(),
            cube_count,
            cube_dim,
            bindings.len(),
        )?;

        let bindings = bindings.iter().map(|handle| (*handle).clone()).collect();
        self.channel
            .execute(kernel.clone(), cube_count, cube_dim, bindings)
    }

    /// Waits for every enqueued command, returning the first execution error.
    pub fn flush(&self) -> Result<(), OperationError> {
        self.channel.flush()
    }

    /// Get the current memory usage of this client.
    pub fn memory_usage(&self) -> Result<MemoryUsage, OperationError> {
        self.channel.memory_usage()
    }
}
