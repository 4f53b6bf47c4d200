//! # Observability
//!
//! Tracing setup for the keensms bridge.
//!
//! Services call [`init_with_config`] once at startup and then use the
//! standard `tracing` macros. Where the output goes is decided here:
//!
//! - a compact, human-readable layer on stderr (the default for a service
//!   running under systemd or docker)
//! - optionally, a JSON-lines file that can be tailed with `jq` or `lnav`
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "keensms".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! });
//! tracing::info!("ready");
//! ```

mod file;

pub use file::CentralLogWriter;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded on the startup line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSON-lines log file. Parent directories are created.
    pub log_path: Option<PathBuf>,

    /// Emit compact logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// A log file that cannot be opened is reported on stderr and skipped;
/// logging setup never aborts the service.
pub fn init_with_config(config: LogConfig) {
    let file_layer = config.log_path.as_ref().and_then(|path| {
        match CentralLogWriter::new(path) {
            Ok(writer) => Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(writer)
                    .with_filter(env_filter(&config.default_level)),
            ),
            Err(e) => {
                eprintln!("failed to open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    // A subscriber may already be installed (tests, embedding); keep it.
    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            service = %config.service_name,
            level = %config.default_level,
            log_path = ?config.log_path,
            "observability initialized"
        );
    }
}

/// `RUST_LOG` wins over the configured level.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
