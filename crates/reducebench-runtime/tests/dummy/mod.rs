mod kernel;
mod server;

pub use kernel::*;
pub use server::*;

use reducebench_runtime::{
    client::ComputeClient, logging::ServerLogger, platform::DeviceProperties, server::CpuServer,
};

/// A client to a host device with a small, deterministic worker pool.
pub fn test_client() -> ComputeClient {
    let properties = DeviceProperties {
        num_workers: 2,
        ..Default::default()
    };
    let server = CpuServer::new(&properties, ServerLogger::disabled());

    ComputeClient::new(server, properties).unwrap()
}
