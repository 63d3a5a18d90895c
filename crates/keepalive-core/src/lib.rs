//! keepalive-core — shared types for the keepalive monitor.
//!
//! Holds the pieces every other crate agrees on:
//!
//! - [`Endpoint`], [`ProbeAttempt`] and [`ProbeOutcome`] describing checks
//! - [`ErrorLog`], the accumulator of terminal failures between digests
//! - [`MonitorConfig`], loaded from built-in defaults, an optional TOML
//!   file, and the `EMAIL_*` environment variables

pub mod config;
pub mod error;
pub mod error_log;
pub mod types;

pub use config::{EmailCredentials, MonitorConfig, parse_duration};
pub use error::{ConfigError, ConfigResult};
pub use error_log::ErrorLog;
pub use types::*;
