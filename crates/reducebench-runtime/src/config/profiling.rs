use super::logger::{LogLevel, LoggerConfig};

/// Configuration of the kernel execution profiler.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProfilingConfig {
    /// Where profiling output goes.
    #[serde(default)]
    pub logger: LoggerConfig<ProfilingLogLevel>,
}

/// Amount of profiling output.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProfilingLogLevel {
    /// Nothing is profiled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// A summary table is emitted at every flush.
    #[serde(rename = "basic")]
    Basic,

    /// Every kernel execution is emitted, followed by the summary table at every flush.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for ProfilingLogLevel {}
