use reducebench_runtime::{
    client::ComputeClient,
    kernel::{CubeCount, CubeDim, KernelHandle},
    program::{CompiledProgram, Program},
    server::Handle,
};

use crate::{
    CombinePartialsKernel, ReduceConfig, ReduceError, SharedSumKernel, COMBINE_KERNEL,
    SHARED_SUM_KERNEL,
};

/// The entry points of a reduction, retrieved from a built program.
#[derive(new, Debug, Clone)]
pub struct ReduceKernels {
    /// Folds every cube's slice into one partial sum.
    pub shared_sum: KernelHandle,
    /// Combines the partial sums into slot 0.
    pub combine: KernelHandle,
}

impl ReduceKernels {
    /// A program holding both reduction entry points.
    pub fn program(name: impl Into<String>) -> Program {
        Program::new(name)
            .with_kernel(SharedSumKernel)
            .with_kernel(CombinePartialsKernel)
    }

    /// Retrieves both entry points from a built program.
    pub fn from_program(program: &CompiledProgram) -> Result<Self, ReduceError> {
        Ok(Self::new(
            program.kernel(SHARED_SUM_KERNEL)?,
            program.kernel(COMBINE_KERNEL)?,
        ))
    }
}

/// Enqueues a reduction of `input` into slot 0 of `partials`.
///
/// Nothing waits on the queue: the result is available to any read enqueued afterwards.
pub fn launch_reduce(
    client: &ComputeClient,
    kernels: &ReduceKernels,
    config: &ReduceConfig,
    input: &Handle,
    partials: &Handle,
) -> Result<(), ReduceError> {
    check_size("input", config.input_size(), input)?;
    check_size("partial-sums", config.partials_size(), partials)?;
    if !partials.can_mut() {
        return Err(ReduceError::PartialsInUse);
    }

    log::trace!(
        "Reducing {} elements over {} cubes of {} units",
        config.len,
        config.num_cubes(),
        config.cube_dim.num_elems()
    );

    client.launch(
        &kernels.shared_sum,
        config.cube_count,
        config.cube_dim,
        &[input, partials],
    )?;
    client.launch(
        &kernels.combine,
        CubeCount::new_single(),
        CubeDim::new_single(),
        &[partials],
    )?;

    Ok(())
}

/// Sums `input` on the device, in cubes of `cube_dim` units.
pub fn reduce(
    client: &ComputeClient,
    kernels: &ReduceKernels,
    input: &[f32],
    cube_dim: u32,
) -> Result<f32, ReduceError> {
    let config = ReduceConfig::generate(input.len(), cube_dim, client.properties())?;

    let input = client.create_from_slice(input)?;
    let partials = client.empty(config.partials_size())?;
    launch_reduce(client, kernels, &config, &input, &partials)?;

    Ok(client.read_one::<f32>(&partials, 0)?)
}

fn check_size(name: &'static str, expected: usize, handle: &Handle) -> Result<(), ReduceError> {
    if handle.size() != expected {
        Err(ReduceError::BufferSize {
            name,
            expected,
            actual: handle.size(),
        })
    } else {
        Ok(())
    }
}
