use core::{fmt::Display, time::Duration};

use crate::config::{
    compilation::CompilationLogLevel, profiling::ProfilingLogLevel, GlobalConfig, Logger,
};

use super::{ProfileLevel, Profiled};

/// Logger owned by a compute server: build logs and kernel profiling.
///
/// Without any enabled category no sink is opened and every call is a no-op.
#[derive(Debug, Default)]
pub struct ServerLogger {
    sinks: Option<Logger>,
    compilation: bool,
    profile: Option<ProfileLevel>,
    profiled: Profiled,
}

impl ServerLogger {
    /// Creates a server logger from the given configuration.
    pub fn new(config: &GlobalConfig) -> Self {
        let compilation = config.compilation.logger.level == CompilationLogLevel::Full;
        let profile = match config.profiling.logger.level {
            ProfilingLogLevel::Disabled => None,
            ProfilingLogLevel::Basic => Some(ProfileLevel::Basic),
            ProfilingLogLevel::Full => Some(ProfileLevel::Full),
        };
        let sinks = (compilation || profile.is_some()).then(|| Logger::new(config));

        Self {
            sinks,
            compilation,
            profile,
            profiled: Profiled::default(),
        }
    }

    /// A logger that never emits anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// The profile level, `None` when profiling is off.
    pub fn profile_level(&self) -> Option<ProfileLevel> {
        self.profile
    }

    /// Whether build logs are emitted.
    pub fn compilation_activated(&self) -> bool {
        self.compilation
    }

    /// Registers the execution time of a kernel.
    pub fn register_profiled<Name: Display>(&mut self, name: Name, duration: Duration) {
        let Some(level) = self.profile else {
            return;
        };

        let name = name.to_string();
        self.profiled.update(&name, duration);

        if level == ProfileLevel::Full {
            if let Some(sinks) = self.sinks.as_mut() {
                sinks.log_profiling(&format!("| {duration:<10?} | {name}"));
            }
        }
    }

    /// Emits a build log when build logging is on, returns its argument.
    pub fn log_compilation<I: Display>(&mut self, arg: I) -> I {
        if self.compilation {
            if let Some(sinks) = self.sinks.as_mut() {
                sinks.log_compilation(&arg);
            }
        }
        arg
    }

    /// Emits the kernels profiled since the last summary, then forgets them.
    pub fn profile_summary(&mut self) {
        if self.profile.is_none() || self.profiled.is_empty() {
            return;
        }

        let profiled = core::mem::take(&mut self.profiled);
        if let Some(sinks) = self.sinks.as_mut() {
            sinks.log_profiling(&profiled);
        }
    }
}
