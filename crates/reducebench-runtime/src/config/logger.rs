use super::{compilation::CompilationLogLevel, profiling::ProfilingLogLevel, GlobalConfig};
use core::fmt::Display;
use hashbrown::HashMap;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Sinks of one log category. Any combination of them can be active.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "", default)]
pub struct LoggerConfig<L: LogLevel> {
    /// Log file path.
    pub file: Option<PathBuf>,
    /// Appends to the log file instead of truncating it.
    pub append: bool,
    /// Writes to standard output.
    pub stdout: bool,
    /// Writes to standard error.
    pub stderr: bool,
    /// Forwards to the `log` facade at this level.
    pub log: Option<LogCrateLevel>,
    /// Verbosity of the category.
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Level of the records forwarded to the `log` facade.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogCrateLevel {
    /// `log::info!`.
    #[default]
    Info,
    /// `log::debug!`.
    Debug,
    /// `log::trace!`.
    Trace,
}

/// Verbosity of a log category.
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Routes build logs and profiling output to their sinks.
///
/// A sink requested by both categories is opened once and shared.
#[derive(Debug, Default)]
pub struct Logger {
    sinks: Vec<Sink>,
    compilation: Vec<usize>,
    profiling: Vec<usize>,
}

impl Logger {
    /// Opens the sinks of every enabled category. Unwritable log files are skipped with a warning.
    pub fn new(config: &GlobalConfig) -> Self {
        let mut logger = Self::default();
        let mut opened = HashMap::new();

        if config.compilation.logger.level != CompilationLogLevel::Disabled {
            logger.compilation = logger.open(&config.compilation.logger, &mut opened);
        }
        if config.profiling.logger.level != ProfilingLogLevel::Disabled {
            logger.profiling = logger.open(&config.profiling.logger, &mut opened);
        }

        logger
    }

    /// Writes a build log record.
    pub fn log_compilation<S: Display>(&mut self, msg: &S) {
        emit(&mut self.sinks, &self.compilation, msg);
    }

    /// Writes a profiling record.
    pub fn log_profiling<S: Display>(&mut self, msg: &S) {
        emit(&mut self.sinks, &self.profiling, msg);
    }

    fn open<L: LogLevel>(
        &mut self,
        config: &LoggerConfig<L>,
        opened: &mut HashMap<SinkKey, usize>,
    ) -> Vec<usize> {
        SinkKey::requested(config)
            .into_iter()
            .filter_map(|key| {
                if let Some(index) = opened.get(&key) {
                    return Some(*index);
                }

                let sink = key.open(config.append)?;
                self.sinks.push(sink);
                let index = self.sinks.len() - 1;
                opened.insert(key, index);
                Some(index)
            })
            .collect()
    }
}

fn emit<S: Display>(sinks: &mut [Sink], routes: &[usize], msg: &S) {
    for index in routes {
        sinks[*index].write(msg);
    }
}

#[derive(Debug, Hash, PartialEq, Eq)]
enum SinkKey {
    File(PathBuf),
    Stdout,
    Stderr,
    Log(LogCrateLevel),
}

impl SinkKey {
    fn requested<L: LogLevel>(config: &LoggerConfig<L>) -> Vec<Self> {
        let mut keys = Vec::new();
        keys.extend(config.file.clone().map(SinkKey::File));
        if config.stdout {
            keys.push(SinkKey::Stdout);
        }
        if config.stderr {
            keys.push(SinkKey::Stderr);
        }
        keys.extend(config.log.map(SinkKey::Log));
        keys
    }

    fn open(&self, append: bool) -> Option<Sink> {
        let sink = match self {
            SinkKey::File(path) => match open_file(path, append) {
                Ok(writer) => Sink::File(writer),
                Err(err) => {
                    log::warn!("Can't open log file {}: {err}", path.display());
                    return None;
                }
            },
            SinkKey::Stdout => Sink::Stdout,
            SinkKey::Stderr => Sink::Stderr,
            SinkKey::Log(level) => Sink::Log(*level),
        };

        Some(sink)
    }
}

fn open_file(path: &Path, append: bool) -> std::io::Result<BufWriter<File>> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    options.open(path).map(BufWriter::new)
}

#[derive(Debug)]
enum Sink {
    File(BufWriter<File>),
    Stdout,
    Stderr,
    Log(LogCrateLevel),
}

impl Sink {
    fn write<S: Display>(&mut self, msg: &S) {
        match self {
            // Flushed per record so the file can be followed during a run.
            Sink::File(writer) => {
                if let Err(err) = writeln!(writer, "{msg}").and_then(|_| writer.flush()) {
                    log::warn!("Can't write to log file: {err}");
                }
            }
            Sink::Stdout => println!("{msg}"),
            Sink::Stderr => eprintln!("{msg}"),
            Sink::Log(LogCrateLevel::Info) => log::info!("{msg}"),
            Sink::Log(LogCrateLevel::Debug) => log::debug!("{msg}"),
            Sink::Log(LogCrateLevel::Trace) => log::trace!("{msg}"),
        }
    }
}
