//! Typed configuration built from the merged settings tree.

use crate::{ConfigError, ConfigResult, Settings};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

/// Main bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub keenetic: KeeneticConfig,
    #[serde(default)]
    pub access: AccessConfig,
    pub mqtt: MqttConfig,
}

/// `logging.*` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Lower the default level to `debug`.
    #[serde(default)]
    pub debug: bool,
    /// Optional JSON-lines log file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// `keenetic.*` section: router address, credentials and reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct KeeneticConfig {
    /// Seconds between polling cycles.
    #[serde(rename = "request_interval")]
    pub request_interval_secs: f64,
    #[serde(deserialize_with = "scalar_as_string")]
    pub host: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub password: String,
    #[serde(default)]
    pub mark_as_read: bool,
    #[serde(default)]
    pub delete_processed: bool,
    /// `strftime` format of the router's SMS timestamps.
    pub datetime_format: String,
    /// Consecutive cycles with every interface unreachable before stopping.
    #[serde(default = "default_outage_cycles")]
    pub outage_cycles: usize,
}

fn default_outage_cycles() -> usize {
    3
}

impl KeeneticConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_secs_f64(self.request_interval_secs)
    }

    /// Deletion wins over mark-as-read when both are enabled.
    pub fn reconcile_policy(&self) -> ReconcilePolicy {
        if self.delete_processed {
            ReconcilePolicy::Delete
        } else if self.mark_as_read {
            ReconcilePolicy::MarkRead
        } else {
            ReconcilePolicy::Leave
        }
    }
}

/// What happens on the router to messages accepted in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Delete accepted messages.
    Delete,
    /// Mark accepted messages as read.
    MarkRead,
    /// Leave them unread; they are fetched and handled again next cycle.
    Leave,
}

/// `access.*` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// Authorized senders. Empty means nobody is accepted.
    #[serde(default, deserialize_with = "phones_as_strings")]
    pub phones: Vec<String>,
}

/// `mqtt.*` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    /// Client id of the real subscriber; enables the parked subscription.
    #[serde(default)]
    pub subscriber_id: Option<String>,
    pub publisher_id: String,
    #[serde(default = "default_qos")]
    pub qos: u8,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Seconds between re-parking the subscriber session.
    #[serde(rename = "park_interval", default = "default_park_interval")]
    pub park_interval_secs: u64,
    /// Seconds to wait for the broker to acknowledge a publish.
    #[serde(rename = "ack_timeout", default = "default_ack_timeout")]
    pub ack_timeout_secs: u64,
}

fn default_qos() -> u8 {
    1
}

fn default_park_interval() -> u64 {
    300
}

fn default_ack_timeout() -> u64 {
    10
}

impl MqttConfig {
    pub fn park_interval(&self) -> Duration {
        Duration::from_secs(self.park_interval_secs)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }
}

impl Config {
    /// Build the typed configuration from merged settings.
    ///
    /// Fails with [`ConfigError::MissingSettings`] before looking at anything
    /// else when required router settings are absent.
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        let missing = settings.missing_required();
        if !missing.is_empty() {
            return Err(ConfigError::MissingSettings(
                missing.into_iter().map(str::to_string).collect(),
            ));
        }

        let config: Config = serde_yaml::from_value(settings.tree().clone())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        let interval = self.keenetic.request_interval_secs;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "keenetic.request_interval".to_string(),
                reason: format!("must be a positive number of seconds, got {}", interval),
            });
        }
        if self.keenetic.outage_cycles == 0 {
            return Err(ConfigError::Invalid {
                key: "keenetic.outage_cycles".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.mqtt.qos > 2 {
            return Err(ConfigError::Invalid {
                key: "mqtt.qos".to_string(),
                reason: format!("must be 0, 1 or 2, got {}", self.mqtt.qos),
            });
        }
        if self.mqtt.topic.is_empty() {
            return Err(ConfigError::Invalid {
                key: "mqtt.topic".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// A YAML scalar that may have been written without quotes.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => text,
            Scalar::Unsigned(number) => number.to_string(),
            Scalar::Signed(number) => number.to_string(),
            Scalar::Float(number) => number.to_string(),
            Scalar::Bool(flag) => flag.to_string(),
        }
    }
}

/// Unquoted numeric passwords and usernames come out of YAML as numbers.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(String::from)
}

/// Phone numbers written without quotes come out of YAML as integers.
fn phones_as_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let phones = Option::<Vec<Scalar>>::deserialize(deserializer)?;
    Ok(phones
        .unwrap_or_default()
        .into_iter()
        .map(String::from)
        .collect())
}
