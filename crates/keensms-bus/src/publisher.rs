//! Publisher seam used by the engine.

use crate::BusResult;
use async_trait::async_trait;

/// Publishes serialized messages to the bus.
///
/// Implementations do not retry. A failed publish is retried by the caller
/// on its next cycle.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>, qos: u8) -> BusResult<()>;
}
