//! Merged settings tree with dotted-path lookup.

use crate::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the override file.
pub const CONFIG_PATH_ENV: &str = "KEENSMS_CONFIG";

/// Override file used when `KEENSMS_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "keensms2mqtt.yaml";

/// Settings that must resolve before the bridge can start.
pub const REQUIRED_SETTINGS: [&str; 3] = ["keenetic.host", "keenetic.username", "keenetic.password"];

/// Built-in defaults. Router address and credentials are deliberately absent.
const DEFAULT_CONFIG: &str = r#"
logging:
  debug: false
  file: ~
keenetic:
  request_interval: 5
  mark_as_read: true
  delete_processed: false
  datetime_format: "%a %b %d %H:%M:%S %Y"
  outage_cycles: 3
access:
  phones: []
mqtt:
  host: mqtt.local
  port: 1883
  topic: keensms/messages
  subscriber_id: ~
  publisher_id: keensms-publisher
  qos: 1
  park_interval: 300
  ack_timeout: 10
"#;

/// Read-only configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    tree: Value,
}

impl Settings {
    /// Settings holding only the built-in defaults.
    pub fn defaults() -> ConfigResult<Self> {
        let tree: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        Ok(Self { tree })
    }

    /// Wrap an already merged tree.
    pub fn from_value(tree: Value) -> Self {
        Self { tree }
    }

    /// Defaults deep-merged with `overlay`.
    pub fn with_overrides(overlay: &Value) -> ConfigResult<Self> {
        let defaults = Self::defaults()?;
        Ok(Self {
            tree: deep_merge(&defaults.tree, overlay),
        })
    }

    /// Defaults deep-merged with a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let overlay: Value = serde_yaml::from_str(yaml)?;
        Self::with_overrides(&overlay)
    }

    /// Defaults deep-merged with the file at `path`, if it exists.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Self::defaults();
        }

        debug!(path = %path.display(), "Loading config file");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Self::defaults();
        }
        Self::from_yaml_str(&content)
    }

    /// Resolve a dot-separated path such as `access.phones`.
    ///
    /// Returns `None` when any step is missing or is not a mapping, and for
    /// explicit YAML nulls.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.tree;
        for part in path.split('.') {
            node = node.as_mapping()?.get(part)?;
        }
        match node {
            Value::Null => None,
            value => Some(value),
        }
    }

    /// Boolean lookup; absent or non-boolean values read as `false`.
    pub fn flag(&self, path: &str) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Required settings that do not resolve.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_SETTINGS
            .iter()
            .copied()
            .filter(|path| self.get(path).is_none())
            .collect()
    }

    /// True when every required setting resolves.
    pub fn is_valid(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// The merged tree.
    pub fn tree(&self) -> &Value {
        &self.tree
    }
}

/// Path of the override file: `KEENSMS_CONFIG` or `keensms2mqtt.yaml`.
pub fn config_path_from_env() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Recursively merge `overlay` into `base`.
///
/// Mappings present on both sides are merged key by key. Any other overlay
/// value replaces the base value, except `null`, which keeps the base.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let value = match base_map.get(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Mapping(merged)
        }
        (_, Value::Null) => base.clone(),
        _ => overlay.clone(),
    }
}
