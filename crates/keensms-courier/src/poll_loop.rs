//! Fixed-interval driver for the engine.

use crate::action::MessageAction;
use crate::engine::{CycleReport, ReconciliationEngine};
use crate::error::CourierResult;
use keenetic_client::RouterGateway;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Repeats engine cycles with a pause between them until shutdown.
#[derive(Debug)]
pub struct PollLoop<R, A> {
    engine: ReconciliationEngine<R, A>,
    interval: Duration,
}

impl<R: RouterGateway, A: MessageAction> PollLoop<R, A> {
    pub fn new(engine: ReconciliationEngine<R, A>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    pub fn engine(&self) -> &ReconciliationEngine<R, A> {
        &self.engine
    }

    /// Run a single cycle and log its report.
    pub async fn run_once(&mut self) -> CourierResult<CycleReport> {
        let report = self.engine.run_cycle().await?;
        report.log();
        Ok(report)
    }

    /// Run until a shutdown signal or a fatal cycle error.
    ///
    /// Shutdown is honoured during the pause and inside a cycle; an
    /// interrupted cycle is abandoned without finishing its batch. A closed
    /// channel counts as shutdown.
    pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> CourierResult<()> {
        info!(
            interfaces = ?self.engine.interfaces(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting poll loop"
        );

        loop {
            tokio::select! {
                result = self.engine.run_cycle() => match result {
                    Ok(report) => report.log(),
                    Err(e) => {
                        error!(error = %e, "Fatal error in polling cycle, stopping");
                        return Err(e);
                    }
                },
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested during cycle");
                    return Ok(());
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    return Ok(());
                }
            }
        }
    }
}
