//! keensms2mqtt binary entry point.
//!
//! Usage: keensms2mqtt [--config <path>] [--log-level <level>] [--log-only] [--once]
//!
//! Settings come from built-in defaults merged with the YAML file given by
//! --config, `KEENSMS_CONFIG`, or `keensms2mqtt.yaml` in the working
//! directory.

mod app;
mod signals;

use clap::Parser;
use std::path::PathBuf;

/// Forward SMS received by a Keenetic router to an MQTT topic.
#[derive(Parser, Debug)]
#[command(name = "keensms2mqtt")]
#[command(about = "Forward SMS received by a Keenetic router to MQTT", version)]
pub struct Args {
    /// YAML file overriding the built-in defaults.
    #[arg(long, env = "KEENSMS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log accepted messages instead of publishing them.
    #[arg(long)]
    pub log_only: bool,

    /// Run a single polling cycle and exit.
    #[arg(long)]
    pub once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    app::run(args).await
}
