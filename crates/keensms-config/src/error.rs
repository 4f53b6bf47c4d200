//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required settings are absent
    #[error("Missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<String>),

    /// A setting is present but has an unusable value
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// Config file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing or typed deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
