//! Logging setup for intake
//!
//! Library code only emits `tracing` events. An application that wants them
//! rendered installs a subscriber once, either its own or the one built here.
//! The default is JSON to STDOUT at INFO level.
//!
//! ```no_run
//! use intake_core::logging::*;
//!
//! let _guard = LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Pretty)
//!     .init()
//!     .expect("subscriber already installed");
//!
//! info!("request input layer ready");
//! ```

use crate::Error;
use std::io;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Most verbose - shows all logs
    Trace,
    /// Per-part and per-rule decisions
    Debug,
    /// Stored uploads and configuration
    Info,
    /// Skipped rules and cleanup failures
    Warn,
    /// Error messages for failures
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// Convert to string for EnvFilter
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::Internal(format!("unknown log level `{other}`"))),
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format (default) - structured, machine-readable
    Json,
    /// Plain text format - simple, human-readable
    Plain,
    /// Pretty format - multi-line, for development
    Pretty,
    /// Compact format - minimal output
    Compact,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "plain" | "text" => Ok(LogFormat::Plain),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::Internal(format!("unknown log format `{other}`"))),
        }
    }
}

/// Output destination for logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    /// Write to STDOUT (default)
    Stdout,
    /// Write to STDERR
    Stderr,
    /// Append to a single file
    File(String),
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Output destination
    pub output: LogOutput,
    /// Include target (module path)
    pub targets: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub file_line: bool,
    /// Enable ANSI colors (ignored for JSON)
    pub colors: bool,
    /// Custom filter directives (overrides level if set)
    pub env_filter: Option<String>,
}

impl LogConfig {
    /// Create a new logging configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set log level
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set output format
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set output destination
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Enable or disable target (module path)
    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    /// Enable or disable thread IDs
    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.thread_ids = enable;
        self
    }

    /// Enable or disable file and line numbers
    pub fn with_file_line(mut self, enable: bool) -> Self {
        self.file_line = enable;
        self
    }

    /// Enable or disable ANSI colors
    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    /// Set filter directives, e.g. `"intake_validation=debug,intake_storage=info"`
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Build the filter: explicit directives, then `RUST_LOG`, then the level.
    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(directives) => {
                EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
        }
    }

    /// Install the global subscriber.
    ///
    /// The returned guard flushes buffered lines when dropped; keep it alive
    /// for the life of the program. Fails if a global subscriber is already
    /// installed or the log file cannot be opened.
    pub fn init(self) -> Result<WorkerGuard, Error> {
        let (writer, guard) = match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                tracing_appender::non_blocking(file)
            }
        };

        let filter = self.filter();
        tracing_subscriber::registry()
            .with(self.layer(writer).with_filter(filter))
            .try_init()
            .map_err(|e| Error::Internal(format!("failed to install log subscriber: {e}")))?;

        Ok(guard)
    }

    fn layer(&self, writer: NonBlocking) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(self.targets)
                .with_thread_ids(self.thread_ids)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .boxed(),
            LogFormat::Plain => fmt::layer()
                .with_writer(writer)
                .with_target(self.targets)
                .with_thread_ids(self.thread_ids)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .with_ansi(self.colors)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(self.targets)
                .with_thread_ids(self.thread_ids)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .with_ansi(self.colors)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_writer(writer)
                .with_target(self.targets)
                .with_thread_ids(self.thread_ids)
                .with_ansi(self.colors)
                .boxed(),
        }
    }
}

impl Default for LogConfig {
    /// Default configuration: JSON format to STDOUT at INFO level
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            targets: true,
            thread_ids: false,
            file_line: false,
            colors: false,
            env_filter: None,
        }
    }
}
