use reducebench_runtime::kernel::{CubeKernel, CubeScope};

/// Adds bindings 0 and 1 element-wise into binding 2.
#[derive(Debug)]
pub struct DummyElementwiseAddition;

impl CubeKernel for DummyElementwiseAddition {
    fn name(&self) -> &'static str {
        "elementwise_addition"
    }

    fn num_bindings(&self) -> usize {
        3
    }

    fn execute_cube(&self, cube: &mut CubeScope<'_>) {
        cube.for_each_unit(|unit| {
            let pos = unit.absolute_pos();
            if pos < unit.binding_len(2) {
                let value = unit.load(0, pos) + unit.load(1, pos);
                unit.store(2, pos, value);
            }
        });
    }
}

/// Reverses binding 0 into binding 1 within a cube, going through shared memory.
#[derive(Debug)]
pub struct DummyCubeReverse;

impl CubeKernel for DummyCubeReverse {
    fn name(&self) -> &'static str {
        "cube_reverse"
    }

    fn num_bindings(&self) -> usize {
        2
    }

    fn shared_memory_size(&self, cube_dim: reducebench_runtime::kernel::CubeDim) -> usize {
        cube_dim.num_elems() as usize
    }

    fn execute_cube(&self, cube: &mut CubeScope<'_>) {
        cube.for_each_unit(|unit| {
            let value = unit.load(0, unit.absolute_pos());
            unit.shared_store(unit.unit_pos(), value);
        });
        cube.sync_cube();
        cube.for_each_unit(|unit| {
            let last = unit.cube_dim().num_elems() - 1;
            let value = unit.shared_load(last - unit.unit_pos());
            unit.store(1, unit.absolute_pos(), value);
        });
    }
}

/// Writes one element past the end of binding 0.
#[derive(Debug)]
pub struct DummyOutOfBounds;

impl CubeKernel for DummyOutOfBounds {
    fn name(&self) -> &'static str {
        "out_of_bounds"
    }

    fn num_bindings(&self) -> usize {
        1
    }

    fn execute_cube(&self, cube: &mut CubeScope<'_>) {
        cube.for_each_unit(|unit| {
            let len = unit.binding_len(0);
            unit.store(0, len, 1.0);
        });
    }
}
