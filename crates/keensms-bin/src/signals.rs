//! SIGINT / SIGTERM to the shutdown channel.

use tokio::sync::broadcast;
use tracing::{info, warn};

/// Wait for the first termination signal.
async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl-C")
    }
}

/// Broadcast shutdown once a termination signal arrives.
///
/// The caller keeps its own sender, so a failed listener leaves the channel
/// open instead of shutting down.
pub fn spawn_signal_forwarder(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                info!(signal, "Received shutdown signal");
                let _ = shutdown_tx.send(());
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signals"),
        }
    });
}
