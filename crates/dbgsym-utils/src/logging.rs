//! # Logging Utilities
//!
//! Subscriber setup for hosts and test suites of the dbgsym crates.
//!
//! The library crates only emit events through `tracing` macros; whoever
//! embeds them decides where the events go. This module provides:
//! - pretty (development) and JSON (production) console output on stderr
//! - optional file output through `tracing-appender`
//! - `RUST_LOG` filtering, falling back to a default level
//! - an idempotent test subscriber that goes through the test harness capture
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: filter directives (e.g. `RUST_LOG=dbgsym_core=trace`)
//! - `DBGSYM_LOG_FORMAT`: `pretty` (default) or `json`
//! - `DBGSYM_LOG_FILE`: optional log file; a directory gets a dated `dbgsym.log` inside it
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbgsym_utils::init_logging;
//!
//! // Keep the guard alive for as long as file output should be flushed.
//! let _guard = init_logging().expect("Failed to initialize logging");
//! tracing::info!("symbol engine ready");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "DBGSYM_LOG_FORMAT";
/// Environment variable naming the optional log file.
pub const LOG_FILE_ENV: &str = "DBGSYM_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel
{
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    /// Includes every node constructor call
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig
{
    /// Level used when `RUST_LOG` is unset or unparseable
    pub level: LogLevel,
    pub format: LogFormat,
    /// Optional file receiving a copy of every event (without ANSI colours)
    pub file: Option<PathBuf>,
}

impl LoggingConfig
{
    /// Settings from `DBGSYM_LOG_FORMAT` and `DBGSYM_LOG_FILE`.
    ///
    /// ## Errors
    ///
    /// Returns an error if `DBGSYM_LOG_FORMAT` holds an unknown format.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        let format = match env::var(LOG_FORMAT_ENV) {
            Ok(raw) => raw.parse()?,
            Err(_) => LogFormat::default(),
        };
        let file = env::var_os(LOG_FILE_ENV).map(PathBuf::from).map(|path| resolve_log_file(&path));
        Ok(Self {
            level: LogLevel::default(),
            format,
            file,
        })
    }

    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self
    {
        Self { level, ..self }
    }
}

/// Initialize logging from the environment.
///
/// The returned guard flushes file output when dropped; it is `None` when no
/// log file is configured.
///
/// ## Errors
///
/// Returns an error if:
/// - a global subscriber is already installed
/// - `DBGSYM_LOG_FORMAT` is invalid
pub fn init_logging() -> Result<Option<WorkerGuard>, LoggingError>
{
    init_logging_with(&LoggingConfig::from_env()?)
}

/// Initialize logging with explicit level and format, console only.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_with(&LoggingConfig {
        level,
        format,
        file: None,
    })
    .map(|_| ())
}

/// Initialize logging from a resolved configuration.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.format, config.level.into())];
    let mut guard = None;

    if let Some(path) = &config.file {
        let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file_name = path.file_name().ok_or_else(|| LoggingError::InvalidFile(path.clone()))?;
        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, worker) = tracing_appender::non_blocking(appender);
        guard = Some(worker);

        let filter = build_filter(config.level.into());
        let file_layer = match config.format {
            LogFormat::Pretty => fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_filter(filter)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_filter(filter)
                .boxed(),
        };
        layers.push(file_layer);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(guard)
}

/// Install a subscriber that writes through the test harness capture.
///
/// Safe to call from every test: only the first call installs anything.
/// Honours `RUST_LOG`, defaulting to `debug`.
pub fn init_test_logging()
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(Level::DEBUG))
        .with_test_writer()
        .with_target(true)
        .try_init();
}

fn console_layer(format: LogFormat, default_level: Level) -> BoxedLayer
{
    let filter = build_filter(default_level);
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

/// `RUST_LOG` directives when set and valid, `default_level` otherwise.
fn build_filter(default_level: Level) -> EnvFilter
{
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
}

/// A directory (existing, or spelled with a trailing separator) gets a dated
/// file name inside it.
fn resolve_log_file(path: &Path) -> PathBuf
{
    let spelled_as_dir = path.as_os_str().to_string_lossy().ends_with(std::path::MAIN_SEPARATOR);
    if spelled_as_dir || path.is_dir() {
        path.join(dated_file_name())
    } else {
        path.to_path_buf()
    }
}

fn dated_file_name() -> String
{
    format!("{}-dbgsym.log", Utc::now().format("%Y-%m-%d"))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Log file path has no file name
    #[error("Invalid log file path: {}", .0.display())]
    InvalidFile(PathBuf),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str(" JSON ").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(matches!(
            LogFormat::from_str("xml"),
            Err(LoggingError::InvalidFormat(format)) if format == "xml"
        ));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("verbose").is_err());
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
    }

    #[test]
    fn test_directory_gets_dated_file()
    {
        let dir = env::temp_dir();
        let resolved = resolve_log_file(&dir);
        assert_eq!(resolved.parent(), Some(dir.as_path()));
        let name = resolved.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-dbgsym.log"));
        assert_eq!(name.len(), "YYYY-MM-DD-dbgsym.log".len());
    }

    #[test]
    fn test_plain_file_is_kept()
    {
        let path = Path::new("logs/session.log");
        assert_eq!(resolve_log_file(path), PathBuf::from("logs/session.log"));
    }

    #[test]
    fn test_init_test_logging_is_idempotent()
    {
        init_test_logging();
        init_test_logging();
        tracing::debug!("test subscriber installed");
    }
}
