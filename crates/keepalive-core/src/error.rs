//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating the monitor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {key}: {value:?}")]
    InvalidDuration { key: &'static str, value: String },

    #[error("invalid digest time {0:?} (expected HH:MM:SS)")]
    InvalidTime(String),

    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}
