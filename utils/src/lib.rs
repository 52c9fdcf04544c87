//! Shared utilities for proxyvote.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
