//! Configuration and utilities for the keensms bridge.
//!
//! Configuration is a YAML tree: built-in defaults deep-merged with an
//! optional override file. The tree is kept for dotted lookups
//! ([`Settings::get`]) and deserialized once into the typed [`Config`]
//! consumed by the rest of the workspace.

mod config;
mod error;
mod logging;
mod settings;

pub use config::{
    AccessConfig, Config, KeeneticConfig, LoggingConfig, MqttConfig, ReconcilePolicy,
};
pub use error::{ConfigError, ConfigResult};
pub use logging::{init_logging, resolve_log_level};
pub use settings::{
    config_path_from_env, deep_merge, Settings, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE,
    REQUIRED_SETTINGS,
};
