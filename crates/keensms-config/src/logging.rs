//! Logging initialization for the bridge.
//!
//! Thin wrapper over the observability crate so binaries only decide the
//! level and the optional log file.

use std::path::PathBuf;

/// Environment variable overriding the configured log level.
const LOG_LEVEL_ENV: &str = "KEENSMS_LOG_LEVEL";

/// Service name written on the observability startup line.
const SERVICE_NAME: &str = "keensms";

/// Initialize tracing for the bridge.
///
/// `RUST_LOG`, when set, still takes precedence over `level`.
pub fn init_logging(level: &str, log_file: Option<PathBuf>) {
    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: log_file,
        also_stderr: true,
    });
}

/// Pick the log level: explicit CLI value, then `KEENSMS_LOG_LEVEL`, then
/// `debug` if `logging.debug` is set, else `info`.
pub fn resolve_log_level(cli_level: Option<&str>, debug_setting: bool) -> String {
    if let Some(level) = cli_level.and_then(non_empty) {
        return level;
    }
    if let Some(level) = std::env::var(LOG_LEVEL_ENV).ok().as_deref().and_then(non_empty) {
        return level;
    }
    if debug_setting {
        "debug".to_string()
    } else {
        "info".to_string()
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins() {
        assert_eq!(resolve_log_level(Some("warn"), true), "warn");
    }

    #[test]
    fn blank_cli_level_is_ignored() {
        std::env::remove_var(LOG_LEVEL_ENV);
        assert_eq!(resolve_log_level(Some("  "), false), "info");
    }

    #[test]
    fn debug_setting_lowers_default() {
        std::env::remove_var(LOG_LEVEL_ENV);
        assert_eq!(resolve_log_level(None, true), "debug");
        assert_eq!(resolve_log_level(None, false), "info");
    }
}
