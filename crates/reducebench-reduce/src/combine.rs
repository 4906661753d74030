use reducebench_runtime::kernel::{CubeKernel, CubeScope};

/// Entry point combining the partial sums.
pub const COMBINE_KERNEL: &str = "reduce_combine";

const PARTIALS: usize = 0;

/// Serially sums every slot of binding 0 into slot 0.
///
/// Only the unit at absolute position 0 works. Launched alone on the queue after the fold, it sees
/// every published partial sum.
#[derive(new, Debug, Clone, Copy, Default)]
pub struct CombinePartialsKernel;

impl CubeKernel for CombinePartialsKernel {
    fn name(&self) -> &'static str {
        COMBINE_KERNEL
    }

    fn num_bindings(&self) -> usize {
        1
    }

    fn execute_cube(&self, cube: &mut CubeScope<'_>) {
        cube.for_each_unit(|unit| {
            if unit.absolute_pos() != 0 {
                return;
            }

            let mut sum = 0.0;
            for i in 0..unit.binding_len(PARTIALS) {
                sum += unit.load(PARTIALS, i);
            }
            unit.store(PARTIALS, 0, sum);
        });
    }
}
