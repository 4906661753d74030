#![warn(missing_docs)]

//! Host-emulated accelerator runtime.
//!
//! The runtime mirrors the layering of a real compute runtime: a [platform](platform::Platform)
//! exposes [devices](platform::Device), a [program](program::Program) is built for those devices,
//! and a [client](client::ComputeClient) enqueues transfers and kernel dispatches on an in-order
//! command queue served by a [compute server](server::ComputeServer) on its own thread.
//!
//! The [CPU server](server::CpuServer) executes kernels one cube (work-group) at a time, spreading
//! cubes across a pool of worker threads.

#[macro_use]
extern crate derive_new;

mod id;
mod scheduler;

/// Compute channel module.
pub mod channel;
/// Compute client module.
pub mod client;
/// Configuration module.
pub mod config;
/// Execution context module.
pub mod context;
/// Error module.
pub mod error;
/// Kernel module.
pub mod kernel;
/// Logging module.
pub mod logging;
/// Platform and device discovery.
pub mod platform;
/// Program compilation module.
pub mod program;
/// Compute server module.
pub mod server;
/// Device memory module.
pub mod storage;
/// Launch validation module.
pub mod validation;

pub use context::ExecutionContext;
pub use error::*;
pub use id::*;
