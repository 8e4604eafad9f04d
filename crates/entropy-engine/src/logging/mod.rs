//! Logging bootstrap.
//!
//! The engine only logs through the `log` facade; this module installs the
//! `env_logger` backend for binaries that want one.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
