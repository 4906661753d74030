use crate::{
    error::{OperationError, StatusCode},
    kernel::{CubeCount, CubeDim, CubeKernel},
    platform::DeviceProperties,
};

const LAUNCH: &str = "enqueueNDRangeKernel";

/// Validate the number of bound buffers matches the kernel signature.
pub fn validate_bindings(kernel: &dyn CubeKernel, bound: usize) -> Result<(), OperationError> {
    let expected = kernel.num_bindings();
    if bound != expected {
        Err(OperationError::new(
            LAUNCH,
            StatusCode::InvalidKernelArgs,
            format!(
                "kernel `{}` expects {expected} buffer(s), {bound} bound",
                kernel.name()
            ),
        ))
    } else {
        Ok(())
    }
}

/// Validate the dispatch covers at least one cube.
pub fn validate_cube_count(cube_count: CubeCount) -> Result<(), OperationError> {
    if cube_count.num_cubes() == 0 {
        Err(OperationError::new(
            LAUNCH,
            StatusCode::InvalidGlobalWorkSize,
            format!("{cube_count:?} holds no cube"),
        ))
    } else {
        Ok(())
    }
}

/// Validate the total units of a cube fits within the hardware limits.
pub fn validate_units(
    properties: &DeviceProperties,
    cube_dim: CubeDim,
) -> Result<(), OperationError> {
    let requested = cube_dim.num_elems();
    let max = properties.max_units_per_cube;
    if requested == 0 || requested > max {
        Err(OperationError::new(
            LAUNCH,
            StatusCode::InvalidWorkGroupSize,
            format!("{requested} units per cube requested, the device supports 1 to {max}"),
        ))
    } else {
        Ok(())
    }
}

/// Validate the shared memory of a cube fits within the hardware limits.
pub fn validate_shared_memory(
    properties: &DeviceProperties,
    kernel: &dyn CubeKernel,
    cube_dim: CubeDim,
) -> Result<(), OperationError> {
    let requested = kernel.shared_memory_size(cube_dim) * core::mem::size_of::<f32>();
    let max = properties.max_shared_memory_size;
    if requested > max {
        Err(OperationError::new(
            LAUNCH,
            StatusCode::OutOfResources,
            format!(
                "kernel `{}` needs {requested} bytes of shared memory, the device supports {max}",
                kernel.name()
            ),
        ))
    } else {
        Ok(())
    }
}

/// Every check performed before a dispatch is enqueued.
pub fn validate_launch(
    properties: &DeviceProperties,
    kernel: &dyn CubeKernel,
    cube_count: CubeCount,
    cube_dim: CubeDim,
    bound: usize,
) -> Result<(), OperationError> {
    validate_bindings(kernel, bound)?;
    validate_cube_count(cube_count)?;
    validate_units(properties, cube_dim)?;
    validate_shared_memory(properties, kernel, cube_dim)
}
