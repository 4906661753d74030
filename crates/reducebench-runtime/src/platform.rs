use crate::{config::device::DeviceConfig, error::RuntimeError};

/// Name of the platform executing kernels on the host.
pub const HOST_PLATFORM: &str = "host";

/// Limits and capabilities of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Maximum number of units in a cube.
    pub max_units_per_cube: u32,
    /// Maximum shared memory per cube, in bytes.
    pub max_shared_memory_size: usize,
    /// Maximum number of buffers bound to a kernel.
    pub max_bindings: u32,
    /// Total bytes the device can hold at once.
    pub global_memory_size: usize,
    /// Number of worker threads executing cubes.
    pub num_workers: usize,
}

impl DeviceProperties {
    /// Properties of a host device configured by `config`.
    pub fn from_config(config: &DeviceConfig) -> Self {
        let num_workers = config.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1)
        });

        Self {
            max_units_per_cube: config.max_units_per_cube,
            max_shared_memory_size: config.max_shared_memory_size,
            max_bindings: config.max_bindings,
            global_memory_size: config.global_memory_size,
            num_workers: num_workers.max(1),
        }
    }
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self::from_config(&DeviceConfig::default())
    }
}

/// A device kernels can be dispatched to.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Human readable name.
    pub name: String,
    /// Limits of the device.
    pub properties: DeviceProperties,
}

/// A vendor driver exposing devices.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Platform name, used for selection.
    pub name: String,
    /// Vendor of the platform.
    pub vendor: String,
    /// Devices of the platform, in discovery order.
    pub devices: Vec<Device>,
}

impl Platform {
    /// The host platform with a single CPU device.
    pub fn host(config: &DeviceConfig) -> Self {
        let properties = DeviceProperties::from_config(config);
        let device = Device::new(
            format!("Host CPU ({} workers)", properties.num_workers),
            properties,
        );

        Self::new(HOST_PLATFORM.to_string(), "reducebench".to_string(), vec![device])
    }

    /// Discovers every available platform.
    pub fn list(config: &DeviceConfig) -> Vec<Platform> {
        let mut platforms = Vec::new();
        if config.enabled {
            platforms.push(Self::host(config));
        }
        log::debug!("Discovered {} platform(s)", platforms.len());
        platforms
    }

    /// Selects the configured platform, or the first one discovered.
    pub fn select(config: &DeviceConfig) -> Result<Platform, RuntimeError> {
        let platforms = Self::list(config);
        let available = platforms.iter().map(|p| p.name.clone()).collect::<Vec<_>>();

        let selected = match &config.platform {
            Some(name) => platforms
                .into_iter()
                .find(|p| p.name.eq_ignore_ascii_case(name)),
            None => platforms.into_iter().next(),
        };

        match selected {
            Some(platform) if !platform.devices.is_empty() => Ok(platform),
            _ => Err(RuntimeError::PlatformUnavailable {
                requested: config.platform.clone(),
                available,
            }),
        }
    }

    /// The first device of the platform.
    pub fn default_device(&self) -> Option<&Device> {
        self.devices.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn host_platform_is_selected_by_default() {
        let platform = Platform::select(&DeviceConfig::default()).unwrap();

        assert_eq!(platform.name, HOST_PLATFORM);
        assert_eq!(platform.devices.len(), 1);
        assert_eq!(platform.devices[0].properties, DeviceProperties::default());
    }

    #[test]
    fn workers_follow_config() {
        let config = DeviceConfig {
            workers: Some(3),
            ..Default::default()
        };
        let platform = Platform::host(&config);

        assert_eq!(platform.devices[0].properties.num_workers, 3);
        assert_eq!(platform.devices[0].name, "Host CPU (3 workers)");
    }

    #[test]
    fn unknown_platform_is_unavailable() {
        let config = DeviceConfig {
            platform: Some("cuda".into()),
            ..Default::default()
        };

        assert_eq!(
            Platform::select(&config),
            Err(RuntimeError::PlatformUnavailable {
                requested: Some("cuda".into()),
                available: vec![HOST_PLATFORM.into()],
            })
        );
    }

    #[test]
    fn disabled_host_leaves_no_platform() {
        let config = DeviceConfig {
            enabled: false,
            ..Default::default()
        };

        assert!(Platform::list(&config).is_empty());
        assert!(Platform::select(&config).is_err());
    }
}
