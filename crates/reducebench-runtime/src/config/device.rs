/// Configuration of the host platform and its device.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Whether the host platform is reported at all.
    pub enabled: bool,
    /// Name of the platform to select, the first one when unset.
    pub platform: Option<String>,
    /// Worker threads executing cubes, the available parallelism when unset.
    pub workers: Option<usize>,
    /// Maximum number of units in a cube.
    pub max_units_per_cube: u32,
    /// Maximum shared memory per cube, in bytes.
    pub max_shared_memory_size: usize,
    /// Maximum number of buffers bound to a kernel.
    pub max_bindings: u32,
    /// Total bytes the device can hold at once.
    pub global_memory_size: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            platform: None,
            workers: None,
            max_units_per_cube: 1024,
            max_shared_memory_size: 48 * 1024,
            max_bindings: 32,
            global_memory_size: 1024 * 1024 * 1024,
        }
    }
}
