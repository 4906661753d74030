use super::{
    compilation::{CompilationConfig, CompilationLogLevel},
    device::DeviceConfig,
    logger::{LogLevel, LoggerConfig},
    profiling::{ProfilingConfig, ProfilingLogLevel},
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names searched for, in order, in the current directory and its parents.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["reducebench.toml", "ReduceBench.toml"];

/// Log file used when `REDUCEBENCH_DEBUG_LOG` is set to `1` or `true`.
pub const DEFAULT_LOG_FILE: &str = "/tmp/reducebench.log";

/// Runtime configuration: build logs, profiling and the emulated device.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Configuration for profiling kernel executions.
    #[serde(default)]
    pub profiling: ProfilingConfig,

    /// Configuration for program build logs.
    #[serde(default)]
    pub compilation: CompilationConfig,

    /// Configuration of the host platform.
    #[serde(default)]
    pub device: DeviceConfig,
}

/// A configuration file exists but can't be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file can't be read.
    #[error("Can't read configuration file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file doesn't have the right format.
    #[error("The configuration file {path} doesn't have the right format: {source}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// An environment override can't be parsed.
    #[error("Invalid value `{value}` for {name}: {reason}")]
    Env {
        /// Name of the variable.
        name: &'static str,
        /// Value of the variable.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl GlobalConfig {
    /// Loads the configuration from the current directory or its parents, then applies the
    /// environment overrides. Defaults are used when no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(load_from_current_dir::<Self>()?.override_from_env())
    }

    /// Overrides configuration fields based on environment variables.
    pub fn override_from_env(self) -> Self {
        match std::env::var("REDUCEBENCH_DEBUG_LOG") {
            Ok(val) => self.with_debug_log(&val),
            Err(_) => self,
        }
    }

    /// Applies a `REDUCEBENCH_DEBUG_LOG` value.
    ///
    /// `stdout` and `stderr` select a stream, `1`/`true` the default log file, `0`/`false` turn
    /// both loggers off and anything else is a log file path.
    pub fn with_debug_log(mut self, val: &str) -> Self {
        let enabled = !matches!(val, "0" | "false");

        if enabled {
            self.compilation.logger.level = CompilationLogLevel::Full;
            self.profiling.logger.level = ProfilingLogLevel::Full;
            route_debug_log(&mut self.compilation.logger, val);
            route_debug_log(&mut self.profiling.logger, val);
        } else {
            self.compilation.logger.level = CompilationLogLevel::Disabled;
            self.profiling.logger.level = ProfilingLogLevel::Disabled;
        }

        self
    }
}

fn route_debug_log<L: LogLevel>(logger: &mut LoggerConfig<L>, target: &str) {
    match target {
        "stdout" => logger.stdout = true,
        "stderr" => logger.stderr = true,
        "1" | "true" => logger.file = Some(DEFAULT_LOG_FILE.into()),
        path => logger.file = Some(path.into()),
    }
}

/// Finds the first configuration file in `dir` or its parents.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let mut dir = dir.to_path_buf();

    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !dir.pop() {
            return None;
        }
    }
}

/// Loads any configuration type from the first configuration file found from the current
/// directory upwards, or its default when there is none.
pub fn load_from_current_dir<T: DeserializeOwned + Default>() -> Result<T, ConfigError> {
    let dir = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;

    match find_config_file(&dir) {
        Some(path) => {
            log::debug!("Loading configuration from {}", path.display());
            from_file_path(path)
        }
        None => Ok(T::default()),
    }
}

/// Loads any configuration type from a file.
pub fn from_file_path<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        log::warn!("Configuration file {} is empty", path.display());
    }

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_partial_file() {
        let config: GlobalConfig = toml::from_str(
            r#"
            [device]
            workers = 2
            max_units_per_cube = 256

            [compilation.logger]
            level = "full"
            stderr = true
            "#,
        )
        .unwrap();

        assert_eq!(config.device.workers, Some(2));
        assert_eq!(config.device.max_units_per_cube, 256);
        assert_eq!(config.device.max_bindings, 32);
        assert_eq!(config.compilation.logger.level, CompilationLogLevel::Full);
        assert!(config.compilation.logger.stderr);
        assert!(config.compilation.logger.append);
        assert_eq!(config.profiling.logger.level, ProfilingLogLevel::Disabled);
    }

    #[test]
    fn debug_log_selects_sinks() {
        let config = GlobalConfig::default().with_debug_log("stderr");
        assert!(config.profiling.logger.stderr);
        assert_eq!(config.profiling.logger.level, ProfilingLogLevel::Full);

        let config = GlobalConfig::default().with_debug_log("0");
        assert_eq!(config.compilation.logger.level, CompilationLogLevel::Disabled);

        let config = GlobalConfig::default().with_debug_log("/var/log/bench.log");
        assert_eq!(
            config.compilation.logger.file,
            Some(PathBuf::from("/var/log/bench.log"))
        );
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let content = toml::to_string_pretty(&GlobalConfig::default()).unwrap();
        let config: GlobalConfig = toml::from_str(&content).unwrap();

        assert_eq!(config.device, DeviceConfig::default());
    }
}
