use core::fmt::Write;

use reducebench_reduce::ReduceError;
use reducebench_runtime::{config::ConfigError, OperationError, RuntimeError};
use thiserror::Error;

use crate::config::Primitive;

/// Where operators look up status codes.
pub const STATUS_CODES_URL: &str =
    "https://github.com/KhronosGroup/OpenCL-Headers/blob/master/CL/cl.h";

/// Every way a benchmark run can fail. None of them is retried.
#[derive(Error, Debug)]
pub enum BenchError {
    /// The configuration can't be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The execution context can't be established.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// An accelerator operation failed.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// The reduction is configured invalidly.
    #[error("Invalid reduction configuration: {0}")]
    Reduce(ReduceError),

    /// The device result is too far from the reference.
    #[error("Invalid value for {primitive}: {result}, expected: {expected} (tolerance: {tolerance})")]
    Validation {
        /// The measured primitive.
        primitive: Primitive,
        /// The device result.
        result: f32,
        /// The reference result.
        expected: f32,
        /// The accepted difference.
        tolerance: f32,
    },

    /// The report can't be written.
    #[error("Can't write the report: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReduceError> for BenchError {
    fn from(err: ReduceError) -> Self {
        match err {
            ReduceError::Launch(err) => BenchError::Operation(err),
            err => BenchError::Reduce(err),
        }
    }
}

impl BenchError {
    /// The accelerator operation behind the error, if any.
    pub fn operation(&self) -> Option<&OperationError> {
        match self {
            BenchError::Operation(err) | BenchError::Runtime(RuntimeError::Operation(err)) => {
                Some(err)
            }
            _ => None,
        }
    }

    /// A message with everything needed to diagnose the failure without running again.
    pub fn diagnostic(&self) -> String {
        let mut out = String::new();

        match self {
            BenchError::Runtime(RuntimeError::Compilation(err)) => {
                let _ = writeln!(out, "{err}");
                for log in err.logs.iter() {
                    let _ = writeln!(out, "Build log for {}:\n{}", log.device, log.log);
                }
            }
            _ => match self.operation() {
                Some(err) => {
                    let code = err.status.code();
                    let _ = writeln!(
                        out,
                        "Accelerator error in {} ({code}): {}",
                        err.operation, err.reason
                    );
                    let _ = writeln!(
                        out,
                        "Search cl.h file for error code ({code}) to understand what it means:"
                    );
                    let _ = writeln!(out, "{STATUS_CODES_URL}");
                }
                None => {
                    let _ = writeln!(out, "{self}");
                }
            },
        }

        out
    }
}
