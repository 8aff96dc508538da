//! # dbgsym Utilities
//!
//! Logging setup shared by the dbgsym crates, their hosts and their test suites.
//!
//! The registry crates only emit `tracing` events; this crate decides where
//! they end up.

pub mod logging;

pub use logging::{
    init_logging, init_logging_with, init_logging_with_level, init_test_logging, LogFormat, LogLevel, LoggingConfig,
    LoggingError,
};
pub use tracing::{debug, error, info, trace, warn};
