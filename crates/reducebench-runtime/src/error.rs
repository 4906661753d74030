use core::fmt::Display;
use thiserror::Error;

/// Status code reported by a failed accelerator operation.
///
/// The numeric values follow the standard compute runtime error table so that a reported code can
/// be looked up where operators usually look them up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// No device matched the request.
    DeviceNotFound,
    /// The device exists but can no longer accept commands.
    DeviceNotAvailable,
    /// The device ran out of global memory.
    MemObjectAllocationFailure,
    /// The device failed while executing a command.
    OutOfResources,
    /// The program failed to build.
    BuildProgramFailure,
    /// An argument was out of range.
    InvalidValue,
    /// A buffer handle isn't known to the device.
    InvalidMemObject,
    /// No kernel with the requested name exists in the program.
    InvalidKernelName,
    /// The bound arguments don't match the kernel signature.
    InvalidKernelArgs,
    /// The cube dimension isn't supported by the device.
    InvalidWorkGroupSize,
    /// The requested buffer size is invalid.
    InvalidBufferSize,
    /// The global range is invalid.
    InvalidGlobalWorkSize,
}

impl StatusCode {
    /// The numeric status code.
    pub const fn code(self) -> i32 {
        match self {
            StatusCode::DeviceNotFound => -1,
            StatusCode::DeviceNotAvailable => -2,
            StatusCode::MemObjectAllocationFailure => -4,
            StatusCode::OutOfResources => -5,
            StatusCode::BuildProgramFailure => -11,
            StatusCode::InvalidValue => -30,
            StatusCode::InvalidMemObject => -38,
            StatusCode::InvalidKernelName => -46,
            StatusCode::InvalidKernelArgs => -52,
            StatusCode::InvalidWorkGroupSize => -54,
            StatusCode::InvalidBufferSize => -61,
            StatusCode::InvalidGlobalWorkSize => -63,
        }
    }

    /// The symbolic name of the status code.
    pub const fn name(self) -> &'static str {
        match self {
            StatusCode::DeviceNotFound => "DEVICE_NOT_FOUND",
            StatusCode::DeviceNotAvailable => "DEVICE_NOT_AVAILABLE",
            StatusCode::MemObjectAllocationFailure => "MEM_OBJECT_ALLOCATION_FAILURE",
            StatusCode::OutOfResources => "OUT_OF_RESOURCES",
            StatusCode::BuildProgramFailure => "BUILD_PROGRAM_FAILURE",
            StatusCode::InvalidValue => "INVALID_VALUE",
            StatusCode::InvalidMemObject => "INVALID_MEM_OBJECT",
            StatusCode::InvalidKernelName => "INVALID_KERNEL_NAME",
            StatusCode::InvalidKernelArgs => "INVALID_KERNEL_ARGS",
            StatusCode::InvalidWorkGroupSize => "INVALID_WORK_GROUP_SIZE",
            StatusCode::InvalidBufferSize => "INVALID_BUFFER_SIZE",
            StatusCode::InvalidGlobalWorkSize => "INVALID_GLOBAL_WORK_SIZE",
        }
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// A failed accelerator operation: allocation, transfer, kernel retrieval or dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Accelerator operation `{operation}` failed with status {status}\nCaused by:\n  {reason}")]
pub struct OperationError {
    /// Name of the failing operation, e.g. `enqueueNDRangeKernel`.
    pub operation: &'static str,
    /// Status code reported by the device.
    pub status: StatusCode,
    /// Human readable cause.
    pub reason: String,
}

impl OperationError {
    /// Creates a new operation error.
    pub fn new(operation: &'static str, status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            operation,
            status,
            reason: reason.into(),
        }
    }

    /// The command queue can't reach its server anymore.
    pub(crate) fn disconnected(operation: &'static str) -> Self {
        Self::new(
            operation,
            StatusCode::DeviceNotAvailable,
            "the command queue was shut down",
        )
    }
}

/// The build output of a program for a single device.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct BuildLog {
    /// Name of the device the program was built for.
    pub device: String,
    /// Build log content.
    pub log: String,
}

/// A program failed to build on at least one device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Program `{program}` failed to build with status {}", StatusCode::BuildProgramFailure)]
pub struct CompilationError {
    /// Name of the program.
    pub program: String,
    /// One build log per candidate device.
    pub logs: Vec<BuildLog>,
}

/// Errors raised while establishing or using an execution context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// No platform matches the configuration.
    #[error(
        "Unable to find an accelerator platform (requested: {}, available: [{}])",
        requested.as_deref().unwrap_or("any"),
        available.join(", ")
    )]
    PlatformUnavailable {
        /// The requested platform name, if any.
        requested: Option<String>,
        /// Names of the platforms that were discovered.
        available: Vec<String>,
    },

    /// The program failed to build.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// An accelerator operation failed.
    #[error(transparent)]
    Operation(#[from] OperationError),
}
