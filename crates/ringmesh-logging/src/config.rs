//! Logging configuration

use std::path::{Path, PathBuf};

/// Prefix of log files written by the command line
pub const CLI_LOG_PREFIX: &str = "ringmesh";

/// How events are rendered on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable lines
    Pretty,
}

/// Console (stderr) output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub format: ConsoleFormat,
    /// Colour the pretty format
    pub ansi: bool,
    /// Console-only level on top of the default level
    pub level: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: ConsoleFormat::Json,
            ansi: false,
            level: None,
        }
    }
}

/// When a new log file is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One file, truncated when logging starts
    Never,
}

/// JSONL file output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub rotation: RotationStrategy,
    /// Rotated files kept; `None` keeps them all
    pub max_files: Option<usize>,
}

impl FileConfig {
    /// A single, truncated log file `<directory>/<prefix>.log`
    pub fn single_file(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            rotation: RotationStrategy::Never,
            max_files: None,
        }
    }

    /// Path of the log file written with [`RotationStrategy::Never`]
    pub fn single_file_path(&self) -> PathBuf {
        self.directory.join(format!("{}.log", self.prefix))
    }
}

/// Where events go and how much of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub default_level: String,
    pub console: ConsoleConfig,
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: None,
        }
    }
}

impl LogConfig {
    /// Logging for the `ringmesh` command line
    ///
    /// The console is pretty-printed at `info`, or at `debug` when
    /// `verbose` so every forwarding decision shows. With a `log_dir`, each
    /// run also writes `<log_dir>/ringmesh.log` as JSONL at `debug`
    /// regardless of the console level.
    pub fn cli(verbose: bool, log_dir: Option<&Path>) -> Self {
        let console_level = if verbose { "debug" } else { "info" };
        let file = log_dir.map(|dir| FileConfig::single_file(dir, CLI_LOG_PREFIX));
        let default_level = if file.is_some() { "debug" } else { console_level };

        Self {
            default_level: default_level.to_string(),
            console: ConsoleConfig {
                enabled: true,
                format: ConsoleFormat::Pretty,
                ansi: true,
                level: Some(console_level.to_string()),
            },
            file,
        }
    }
}
