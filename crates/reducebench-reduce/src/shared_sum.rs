use reducebench_runtime::kernel::{CubeDim, CubeKernel, CubeScope};

/// Entry point folding every cube's slice of the input.
pub const SHARED_SUM_KERNEL: &str = "reduce";

const INPUT: usize = 0;
const PARTIALS: usize = 1;

/// Sums each cube's slice of binding 0 in shared memory and publishes the result at the cube's
/// position in binding 1.
///
/// Units load one element each, then a tree fold halves the active units at every step until
/// unit 0 holds the cube's sum. The cube dim must be a power of two.
#[derive(new, Debug, Clone, Copy, Default)]
pub struct SharedSumKernel;

impl CubeKernel for SharedSumKernel {
    fn name(&self) -> &'static str {
        SHARED_SUM_KERNEL
    }

    fn num_bindings(&self) -> usize {
        2
    }

    fn shared_memory_size(&self, cube_dim: CubeDim) -> usize {
        cube_dim.num_elems() as usize
    }

    fn execute_cube(&self, cube: &mut CubeScope<'_>) {
        cube.for_each_unit(|unit| {
            let value = unit.load(INPUT, unit.absolute_pos());
            unit.shared_store(unit.unit_pos(), value);
        });
        cube.sync_cube();

        sum_shared_memory(cube);

        cube.for_each_unit(|unit| {
            if unit.unit_pos() == 0 {
                let sum = unit.shared_load(0);
                unit.store(PARTIALS, unit.cube_pos(), sum);
            }
        });
    }
}

fn sum_shared_memory(cube: &mut CubeScope<'_>) {
    let mut offset = cube.cube_dim().num_elems() / 2;

    while offset > 0 {
        cube.for_each_unit(|unit| {
            let pos = unit.unit_pos();
            if pos < offset {
                let value = unit.shared_load(pos) + unit.shared_load(pos + offset);
                unit.shared_store(pos, value);
            }
        });
        cube.sync_cube();
        offset /= 2;
    }
}
