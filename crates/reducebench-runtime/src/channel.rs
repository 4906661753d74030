use core::ops::Range;
use std::sync::Arc;

use crate::{
    error::{OperationError, StatusCode},
    kernel::{CubeCount, CubeDim, KernelHandle},
    server::{ComputeServer, Handle},
    storage::MemoryUsage,
};

/// Command queue using a multi-producer, single-consumer channel to communicate with the compute
/// server spawned on its own thread.
///
/// Commands are served in the order they are sent. Dropping the last clone shuts the server down.
#[derive(Debug, Clone)]
pub struct MpscComputeChannel {
    state: Arc<MpscComputeChannelState>,
}

#[derive(Debug)]
struct MpscComputeChannelState {
    sender: async_channel::Sender<Message>,
}

type Callback<Response> = async_channel::Sender<Response>;

enum Message {
    Create(Vec<u8>, Callback<Result<Handle, OperationError>>),
    Empty(usize, Callback<Result<Handle, OperationError>>),
    Read(Handle, Range<usize>, Callback<Result<Vec<u8>, OperationError>>),
    Execute(KernelHandle, CubeCount, CubeDim, Vec<Handle>),
    Flush(Callback<Result<(), OperationError>>),
    MemoryUsage(Callback<MemoryUsage>),
}

impl MpscComputeChannel {
    /// Spawns the server thread and returns a channel to it.
    pub fn new<Server: ComputeServer>(mut server: Server) -> Result<Self, OperationError> {
        let (sender, receiver) = async_channel::unbounded();

        std::thread::Builder::new()
            .name("reducebench-server".into())
            .spawn(move || {
                log::trace!("Compute server started");

                while let Ok(message) = receiver.recv_blocking() {
                    // A dropped callback means the caller gave up waiting, nothing to report.
                    match message {
                        Message::Create(data, callback) => {
                            let _ = callback.send_blocking(server.create(&data));
                        }
                        Message::Empty(size, callback) => {
                            let _ = callback.send_blocking(server.empty(size));
                        }
                        Message::Read(handle, range, callback) => {
                            let _ = callback.send_blocking(server.read(&handle, range));
                        }
                        Message::Execute(kernel, cube_count, cube_dim, bindings) => {
                            server.execute(kernel, cube_count, cube_dim, bindings);
                        }
                        Message::Flush(callback) => {
                            let _ = callback.send_blocking(server.flush());
                        }
                        Message::MemoryUsage(callback) => {
                            let _ = callback.send_blocking(server.memory_usage());
                        }
                    }
                }

                log::trace!("Compute server stopped");
            })
            .map_err(|err| {
                OperationError::new(
                    "createCommandQueue",
                    StatusCode::OutOfResources,
                    format!("can't spawn the server thread: {err}"),
                )
            })?;

        Ok(Self {
            state: Arc::new(MpscComputeChannelState { sender }),
        })
    }

    /// Allocates a buffer holding `data`.
    pub fn create(&self, data: Vec<u8>) -> Result<Handle, OperationError> {
        self.request("enqueueWriteBuffer", |callback| {
            Message::Create(data, callback)
        })?
    }

    /// Allocates a zero-initialized buffer.
    pub fn empty(&self, size: usize) -> Result<Handle, OperationError> {
        self.request("createBuffer", |callback| Message::Empty(size, callback))?
    }

    /// Reads back a byte range of a buffer.
    pub fn read(&self, handle: Handle, range: Range<usize>) -> Result<Vec<u8>, OperationError> {
        self.request("enqueueReadBuffer", |callback| {
            Message::Read(handle, range, callback)
        })?
    }

    /// Enqueues a kernel without waiting for it.
    pub fn execute(
        &self,
        kernel: KernelHandle,
        cube_count: CubeCount,
        cube_dim: CubeDim,
        bindings: Vec<Handle>,
    ) -> Result<(), OperationError> {
        self.state
            .sender
            .send_blocking(Message::Execute(kernel, cube_count, cube_dim, bindings))
            .map_err(|_| OperationError::disconnected("enqueueNDRangeKernel"))
    }

    /// Waits for every queued command.
    pub fn flush(&self) -> Result<(), OperationError> {
        self.request("flush", Message::Flush)?
    }

    /// The memory usage of the server.
    pub fn memory_usage(&self) -> Result<MemoryUsage, OperationError> {
        self.request("getMemoryUsage", Message::MemoryUsage)
    }

    fn request<Response>(
        &self,
        operation: &'static str,
        message: impl FnOnce(Callback<Response>) -> Message,
    ) -> Result<Response, OperationError> {
        let (callback, response) = async_channel::bounded(1);

        self.state
            .sender
            .send_blocking(message(callback))
            .map_err(|_| OperationError::disconnected(operation))?;

        response
            .recv_blocking()
            .map_err(|_| OperationError::disconnected(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{logging::ServerLogger, platform::DeviceProperties, server::CpuServer};

    #[test]
    fn round_trips_through_server_thread() {
        let server = CpuServer::new(&DeviceProperties::default(), ServerLogger::disabled());
        let channel = MpscComputeChannel::new(server).unwrap();

        let handle = channel
            .create(bytemuck::cast_slice(&[7.0f32, 8.0]).to_vec())
            .unwrap();
        channel.flush().unwrap();
        let bytes = channel.read(handle.clone(), 4..8).unwrap();

        assert_eq!(crate::storage::from_bytes::<f32>(&bytes), vec![8.0]);
        assert_eq!(channel.memory_usage().unwrap().bytes_in_use, 8);
    }

    #[test]
    fn commands_are_served_in_order() {
        let server = CpuServer::new(&DeviceProperties::default(), ServerLogger::disabled());
        let channel = MpscComputeChannel::new(server).unwrap();

        let first = channel.empty(4).unwrap();
        drop(first);
        // The release of the first buffer is observed by the next command.
        assert_eq!(channel.memory_usage().unwrap().number_allocs, 0);
    }
}
