/// Compilation config module.
pub mod compilation;
/// Device config module.
pub mod device;
/// Profiling config module.
pub mod profiling;

mod base;
mod logger;

pub use base::*;
pub use logger::{LogCrateLevel, LogLevel, Logger, LoggerConfig};
