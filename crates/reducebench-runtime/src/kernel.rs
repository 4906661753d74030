use core::fmt::Display;
use std::sync::Arc;

use crate::storage::DeviceBuffer;

/// Number of units in a cube, along three axes.
#[derive(new, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeDim {
    /// Units along the x axis.
    pub x: u32,
    /// Units along the y axis.
    pub y: u32,
    /// Units along the z axis.
    pub z: u32,
}

impl CubeDim {
    /// A cube of `x` units.
    pub const fn new_1d(x: u32) -> Self {
        Self { x, y: 1, z: 1 }
    }

    /// A cube holding a single unit.
    pub const fn new_single() -> Self {
        Self::new_1d(1)
    }

    /// Total number of units in the cube.
    pub const fn num_elems(&self) -> u32 {
        self.x * self.y * self.z
    }
}

impl Default for CubeDim {
    fn default() -> Self {
        Self::new_single()
    }
}

/// Number of cubes in a dispatch, along three axes.
#[derive(new, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeCount {
    /// Cubes along the x axis.
    pub x: u32,
    /// Cubes along the y axis.
    pub y: u32,
    /// Cubes along the z axis.
    pub z: u32,
}

impl CubeCount {
    /// `x` cubes.
    pub const fn new_1d(x: u32) -> Self {
        Self { x, y: 1, z: 1 }
    }

    /// A single cube.
    pub const fn new_single() -> Self {
        Self::new_1d(1)
    }

    /// Total number of cubes.
    pub const fn num_cubes(&self) -> u32 {
        self.x * self.y * self.z
    }
}

/// A kernel entry point executed one cube at a time.
///
/// Implementations describe a cube's work as phases through [CubeScope::for_each_unit], separated
/// by [CubeScope::sync_cube] barriers.
pub trait CubeKernel: Send + Sync + core::fmt::Debug + 'static {
    /// The entry-point name the kernel is retrieved by.
    fn name(&self) -> &'static str;

    /// Number of global buffers bound at launch.
    fn num_bindings(&self) -> usize;

    /// Number of shared memory elements each cube needs for the given cube dim.
    fn shared_memory_size(&self, _cube_dim: CubeDim) -> usize {
        0
    }

    /// Executes a single cube.
    fn execute_cube(&self, cube: &mut CubeScope<'_>);
}

/// A kernel shared between the program and the command queue.
pub type KernelHandle = Arc<dyn CubeKernel>;

/// Invalid memory access performed by a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// Global memory access past the end of a binding.
    GlobalOutOfBounds {
        /// Binding index.
        binding: usize,
        /// Accessed element.
        index: u32,
        /// Length of the binding in elements.
        len: usize,
    },
    /// Shared memory access past the end of the cube's scratch region.
    SharedOutOfBounds {
        /// Accessed element.
        index: u32,
        /// Length of the scratch region in elements.
        len: usize,
    },
    /// Access to a binding that wasn't bound.
    Unbound {
        /// Binding index.
        binding: usize,
    },
    /// The kernel panicked.
    Panicked(String),
}

/// The first fault raised while executing a dispatch.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct KernelFault {
    /// Cube the fault happened in.
    pub cube_pos: u32,
    /// Unit the fault happened in.
    pub unit_pos: u32,
    /// What went wrong.
    pub kind: FaultKind,
}

impl Display for KernelFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cube {} unit {}: ", self.cube_pos, self.unit_pos)?;
        match &self.kind {
            FaultKind::GlobalOutOfBounds {
                binding,
                index,
                len,
            } => write!(
                f,
                "global access at {index} out of bounds for binding {binding} of length {len}"
            ),
            FaultKind::SharedOutOfBounds { index, len } => write!(
                f,
                "shared memory access at {index} out of bounds for length {len}"
            ),
            FaultKind::Unbound { binding } => write!(f, "binding {binding} isn't bound"),
            FaultKind::Panicked(msg) => write!(f, "kernel panicked: {msg}"),
        }
    }
}

/// Execution state of one cube.
///
/// Within a phase, every unit runs to completion before the next phase starts, in unspecified
/// order. Shared memory written by a unit is only meant to be read by other units after a
/// [sync_cube](CubeScope::sync_cube).
pub struct CubeScope<'a> {
    cube_pos: u32,
    cube_dim: CubeDim,
    cube_count: CubeCount,
    shared: &'a mut [f32],
    bindings: &'a [Arc<DeviceBuffer>],
    fault: Option<KernelFault>,
    num_syncs: u32,
}

impl<'a> CubeScope<'a> {
    pub(crate) fn new(
        cube_pos: u32,
        cube_dim: CubeDim,
        cube_count: CubeCount,
        shared: &'a mut [f32],
        bindings: &'a [Arc<DeviceBuffer>],
    ) -> Self {
        Self {
            cube_pos,
            cube_dim,
            cube_count,
            shared,
            bindings,
            fault: None,
            num_syncs: 0,
        }
    }

    /// Position of the cube in the dispatch.
    pub fn cube_pos(&self) -> u32 {
        self.cube_pos
    }

    /// Dimension of the cube.
    pub fn cube_dim(&self) -> CubeDim {
        self.cube_dim
    }

    /// Number of cubes in the dispatch.
    pub fn cube_count(&self) -> CubeCount {
        self.cube_count
    }

    /// Number of barriers the cube went through so far.
    pub fn num_syncs(&self) -> u32 {
        self.num_syncs
    }

    /// Runs `func` for every unit of the cube.
    pub fn for_each_unit<F>(&mut self, mut func: F)
    where
        F: FnMut(&mut Unit<'_>),
    {
        for unit_pos in 0..self.cube_dim.num_elems() {
            let mut unit = Unit {
                unit_pos,
                cube_pos: self.cube_pos,
                cube_dim: self.cube_dim,
                cube_count: self.cube_count,
                shared: &mut *self.shared,
                bindings: self.bindings,
                fault: &mut self.fault,
            };
            func(&mut unit);
        }
    }

    /// Barrier: every unit of the cube reached this point.
    pub fn sync_cube(&mut self) {
        self.num_syncs += 1;
    }

    pub(crate) fn finish(self) -> Result<(), KernelFault> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

/// One logical thread of a cube.
///
/// Memory accesses are bounds checked: an invalid access records a [fault](KernelFault) reported
/// at the next synchronization point, loads then return `0.0` and stores are dropped.
pub struct Unit<'a> {
    unit_pos: u32,
    cube_pos: u32,
    cube_dim: CubeDim,
    cube_count: CubeCount,
    shared: &'a mut [f32],
    bindings: &'a [Arc<DeviceBuffer>],
    fault: &'a mut Option<KernelFault>,
}

impl Unit<'_> {
    /// Position of the unit within its cube.
    pub fn unit_pos(&self) -> u32 {
        self.unit_pos
    }

    /// Position of the unit's cube.
    pub fn cube_pos(&self) -> u32 {
        self.cube_pos
    }

    /// Position of the unit across the whole dispatch.
    pub fn absolute_pos(&self) -> u32 {
        self.cube_pos * self.cube_dim.num_elems() + self.unit_pos
    }

    /// Dimension of the unit's cube.
    pub fn cube_dim(&self) -> CubeDim {
        self.cube_dim
    }

    /// Number of cubes in the dispatch.
    pub fn cube_count(&self) -> CubeCount {
        self.cube_count
    }

    /// Length of a binding in elements, zero when unbound.
    pub fn binding_len(&self, binding: usize) -> u32 {
        self.bindings
            .get(binding)
            .map(|buffer| buffer.len() as u32)
            .unwrap_or(0)
    }

    /// Reads a shared memory element.
    pub fn shared_load(&mut self, index: u32) -> f32 {
        match self.shared.get(index as usize) {
            Some(value) => *value,
            None => {
                let len = self.shared.len();
                self.raise(FaultKind::SharedOutOfBounds { index, len });
                0.0
            }
        }
    }

    /// Writes a shared memory element.
    pub fn shared_store(&mut self, index: u32, value: f32) {
        match self.shared.get_mut(index as usize) {
            Some(slot) => *slot = value,
            None => {
                let len = self.shared.len();
                self.raise(FaultKind::SharedOutOfBounds { index, len });
            }
        }
    }

    /// Reads a global memory element.
    pub fn load(&mut self, binding: usize, index: u32) -> f32 {
        let Some(buffer) = self.bindings.get(binding) else {
            self.raise(FaultKind::Unbound { binding });
            return 0.0;
        };

        match buffer.load(index as usize) {
            Some(value) => value,
            None => {
                let len = buffer.len();
                self.raise(FaultKind::GlobalOutOfBounds {
                    binding,
                    index,
                    len,
                });
                0.0
            }
        }
    }

    /// Writes a global memory element.
    pub fn store(&mut self, binding: usize, index: u32, value: f32) {
        let Some(buffer) = self.bindings.get(binding) else {
            self.raise(FaultKind::Unbound { binding });
            return;
        };

        if !buffer.store(index as usize, value) {
            let len = buffer.len();
            self.raise(FaultKind::GlobalOutOfBounds {
                binding,
                index,
                len,
            });
        }
    }

    fn raise(&mut self, kind: FaultKind) {
        if self.fault.is_none() {
            *self.fault = Some(KernelFault::new(self.cube_pos, self.unit_pos, kind));
        }
    }
}
