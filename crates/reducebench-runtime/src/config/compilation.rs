use super::logger::{LogLevel, LoggerConfig};

/// Configuration of the program build logs.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CompilationConfig {
    /// Where build logs go.
    #[serde(default)]
    pub logger: LoggerConfig<CompilationLogLevel>,
}

/// Whether build logs are emitted.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompilationLogLevel {
    /// Build logs are only surfaced when a build fails.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Every build log is emitted.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for CompilationLogLevel {}
