//! Console and JSONL file logging for ringmesh
//!
//! Every ringmesh crate logs through `tracing` macros with structured fields
//! (`node`, `target`, `original_sender`, `next_hop`). This crate installs the
//! subscriber that renders them: pretty or JSONL lines on stderr, and
//! optionally JSONL files written by a non-blocking `tracing-appender`
//! worker. `RUST_LOG` overrides the configured default level.
//!
//! ```ignore
//! use ringmesh_logging::{LogConfig, RingmeshSubscriberBuilder};
//!
//! let _guard = RingmeshSubscriberBuilder::new()
//!     .with_config(LogConfig::cli(verbose, log_dir.as_deref()))
//!     .init();
//! ```
//!
//! Keep the returned guard alive for as long as file output should be
//! written; dropping it flushes the background writer.

pub mod config;

pub use config::{
    CLI_LOG_PREFIX, ConsoleConfig, ConsoleFormat, FileConfig, LogConfig, RotationStrategy,
};
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// A type-erased output layer
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// The subscriber assembled by [`RingmeshSubscriberBuilder::build`]
pub type RingmeshSubscriber = Layered<EnvFilter, Layered<Vec<BoxedLayer>, Registry>>;

/// Errors raised while setting up logging
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Failed to create log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create rolling log appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds and installs the ringmesh subscriber
///
/// Without a config the console gets JSONL at `info`.
#[derive(Debug, Clone, Default)]
pub struct RingmeshSubscriberBuilder {
    config: LogConfig,
}

impl RingmeshSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// The configuration the subscriber will be built from
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Assemble the subscriber without installing it
    ///
    /// The guard is `Some` when file output is configured.
    pub fn build(self) -> Result<(RingmeshSubscriber, Option<WorkerGuard>), LogError> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.config.default_level))
            .map_err(|_| LogError::InvalidLevel(self.config.default_level.clone()))?;

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if self.config.console.enabled {
            let console = &self.config.console;
            let layer = match console.format {
                ConsoleFormat::Pretty => fmt::layer()
                    .with_ansi(console.ansi)
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .boxed(),
                ConsoleFormat::Json => jsonl_layer(std::io::stderr),
            };
            let layer = match &console.level {
                Some(level) => layer.with_filter(parse_level(level)?).boxed(),
                None => layer,
            };
            layers.push(layer);
        }

        if let Some(file) = &self.config.file {
            let (writer, file_guard) = file_writer(file)?;
            layers.push(jsonl_layer(writer));
            guard = Some(file_guard);
        }

        let subscriber = Registry::default().with(layers).with(env_filter);
        Ok((subscriber, guard))
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns an error if a global subscriber has already been set.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LogError> {
        let (subscriber, guard) = self.build()?;
        subscriber.try_init()?;
        Ok(guard)
    }

    /// Initialize the subscriber globally
    ///
    /// Setup failures are reported on stderr and leave logging disabled.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, LogError> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| LogError::InvalidLevel(level.to_string()))
}

// Event fields sit at the top level of each line
fn jsonl_layer<W>(writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer)
        .boxed()
}

// `Never` truncates one file per run; rolling files are appended to
fn file_writer(file: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LogError> {
    fs::create_dir_all(&file.directory)?;
    let rotation = match file.rotation {
        RotationStrategy::Never => {
            let handle = File::create(file.single_file_path())?;
            return Ok(tracing_appender::non_blocking(handle));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file.prefix.as_str())
        .filename_suffix("log");
    if let Some(max_files) = file.max_files {
        builder = builder.max_log_files(max_files);
    }
    let appender = builder.build(&file.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}
