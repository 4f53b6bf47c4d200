//! Error types for the courier.

use keenetic_client::RouterError;
use keensms_bus::BusError;
use thiserror::Error;

/// Failure of the accept action for one message.
///
/// Never fatal: the message is left out of the cycle's batch and comes
/// back on the next fetch.
#[derive(Error, Debug)]
pub enum ActionError {
    /// Router timestamp does not match the configured format
    #[error("Timestamp {timestamp:?} does not match format {format:?}: {source}")]
    Format {
        timestamp: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Payload encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bus publish failed or was not acknowledged
    #[error("Publish failed: {0}")]
    Publish(#[from] BusError),
}

impl ActionError {
    pub fn is_format(&self) -> bool {
        matches!(self, ActionError::Format { .. })
    }
}

/// Result type for accept actions.
pub type ActionResult<T> = Result<T, ActionError>;

/// Errors that stop the poll loop.
#[derive(Error, Debug)]
pub enum CourierError {
    /// Router session is unusable (authentication) or a session-level call failed
    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    /// Every interface fetch failed with a connectivity error, cycle after cycle
    #[error("Router unreachable: all {interfaces} interface fetches failed for {cycles} cycles")]
    RouterUnreachable { interfaces: usize, cycles: usize },
}

/// Result type for courier operations.
pub type CourierResult<T> = Result<T, CourierError>;
