use reducebench_runtime::{
    kernel::{CubeCount, CubeDim},
    platform::DeviceProperties,
};

use crate::ReduceError;

/// Units per cube used when none is configured.
pub const DEFAULT_CUBE_DIM: u32 = 128;

const ELEM_SIZE: usize = core::mem::size_of::<f32>();

/// Launch configuration of a reduction: one cube of `cube_dim` units per slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceConfig {
    /// Number of elements reduced.
    pub len: usize,
    /// Cubes of the fold dispatch, one per slice.
    pub cube_count: CubeCount,
    /// Units of every cube, one per element of a slice.
    pub cube_dim: CubeDim,
}

impl ReduceConfig {
    /// Validates a reduction of `len` elements in cubes of `cube_dim` units against the device.
    pub fn generate(
        len: usize,
        cube_dim: u32,
        properties: &DeviceProperties,
    ) -> Result<Self, ReduceError> {
        if len == 0 {
            return Err(ReduceError::EmptyInput);
        }

        if !cube_dim.is_power_of_two() {
            return Err(ReduceError::NotPowerOfTwo { cube_dim });
        }

        if cube_dim > properties.max_units_per_cube {
            return Err(ReduceError::CubeDimTooLarge {
                cube_dim,
                max: properties.max_units_per_cube,
            });
        }

        let shared = cube_dim as usize * ELEM_SIZE;
        if shared > properties.max_shared_memory_size {
            return Err(ReduceError::SharedMemoryTooLarge {
                cube_dim,
                requested: shared,
                max: properties.max_shared_memory_size,
            });
        }

        if len % cube_dim as usize != 0 {
            return Err(ReduceError::UnevenCubes { len, cube_dim });
        }

        // Unit positions are 32-bit.
        let max = u32::MAX as usize;
        if len > max {
            return Err(ReduceError::InputTooLarge { len, max });
        }

        Ok(Self {
            len,
            cube_count: CubeCount::new_1d((len / cube_dim as usize) as u32),
            cube_dim: CubeDim::new_1d(cube_dim),
        })
    }

    /// Number of cubes, and of partial sums.
    pub fn num_cubes(&self) -> usize {
        self.cube_count.num_cubes() as usize
    }

    /// Size of the input buffer in bytes.
    pub fn input_size(&self) -> usize {
        self.len * ELEM_SIZE
    }

    /// Size of the partial-sums buffer in bytes.
    pub fn partials_size(&self) -> usize {
        self.num_cubes() * ELEM_SIZE
    }
}
