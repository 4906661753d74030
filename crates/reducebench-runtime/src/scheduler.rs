use core::ops::Range;
use std::{panic::AssertUnwindSafe, sync::Arc};

use crate::{
    kernel::{CubeCount, CubeDim, CubeKernel, CubeScope, FaultKind, KernelFault},
    storage::DeviceBuffer,
};

/// Spreads the cubes of a dispatch across worker threads.
///
/// Each worker owns a contiguous range of cubes and a scratch region reused for every cube it
/// executes. The dispatch returns once every worker is done.
#[derive(Debug)]
pub(crate) struct Scheduler {
    num_workers: usize,
}

impl Scheduler {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
        }
    }

    pub fn dispatch_execute(
        &self,
        kernel: &dyn CubeKernel,
        cube_count: CubeCount,
        cube_dim: CubeDim,
        bindings: &[Arc<DeviceBuffer>],
    ) -> Result<(), KernelFault> {
        let num_cubes = cube_count.num_cubes();
        let shared_memory_size = kernel.shared_memory_size(cube_dim);
        let num_workers = self.num_workers.min(num_cubes as usize).max(1);
        let cubes_per_worker = (num_cubes as usize).div_ceil(num_workers) as u32;

        if num_workers == 1 {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                execute_cubes(
                    kernel,
                    0..num_cubes,
                    cube_count,
                    cube_dim,
                    shared_memory_size,
                    bindings,
                )
            }));
            return outcome.unwrap_or_else(|payload| {
                Err(KernelFault::new(
                    0,
                    0,
                    FaultKind::Panicked(panic_message(payload.as_ref())),
                ))
            });
        }

        log::trace!(
            "Dispatching {num_cubes} cubes of kernel {} over {num_workers} workers",
            kernel.name()
        );

        std::thread::scope(|scope| {
            let workers = (0..num_workers as u32)
                .map(|worker| {
                    let start = (worker * cubes_per_worker).min(num_cubes);
                    let end = (start + cubes_per_worker).min(num_cubes);
                    let first_cube = start;

                    let task = scope.spawn(move || {
                        log::trace!("Worker {worker} started on cubes {start}..{end}");
                        let result = execute_cubes(
                            kernel,
                            start..end,
                            cube_count,
                            cube_dim,
                            shared_memory_size,
                            bindings,
                        );
                        log::trace!("Worker {worker} stopped");
                        result
                    });
                    (first_cube, task)
                })
                .collect::<Vec<_>>();

            let mut result = Ok(());
            for (first_cube, task) in workers {
                let outcome = task.join().unwrap_or_else(|payload| {
                    Err(KernelFault::new(
                        first_cube,
                        0,
                        FaultKind::Panicked(panic_message(payload.as_ref())),
                    ))
                });
                if result.is_ok() {
                    result = outcome;
                }
            }
            result
        })
    }
}

fn execute_cubes(
    kernel: &dyn CubeKernel,
    cubes: Range<u32>,
    cube_count: CubeCount,
    cube_dim: CubeDim,
    shared_memory_size: usize,
    bindings: &[Arc<DeviceBuffer>],
) -> Result<(), KernelFault> {
    let mut shared = vec![0.0f32; shared_memory_size];

    for cube_pos in cubes {
        shared.fill(0.0);
        let mut scope = CubeScope::new(cube_pos, cube_dim, cube_count, &mut shared, bindings);
        kernel.execute_cube(&mut scope);
        scope.finish()?;
    }

    Ok(())
}

fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
