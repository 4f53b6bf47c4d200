//! What happens to an accepted message.

use crate::error::ActionResult;
use crate::payload;
use async_trait::async_trait;
use keenetic_client::Message;
use keensms_bus::BusPublisher;
use tracing::info;

/// Side effect run once per accepted message per cycle.
///
/// An error keeps the message out of the reconciliation batch, so it is
/// fetched and accepted again next cycle.
#[async_trait]
pub trait MessageAction: Send + Sync {
    async fn accept(&self, message: &Message) -> ActionResult<()>;
}

/// Serialize and publish to the bus.
#[derive(Debug)]
pub struct PublishAction<P> {
    publisher: P,
    topic: String,
    qos: u8,
    datetime_format: String,
}

impl<P: BusPublisher> PublishAction<P> {
    pub fn new(
        publisher: P,
        topic: impl Into<String>,
        qos: u8,
        datetime_format: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            qos,
            datetime_format: datetime_format.into(),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

#[async_trait]
impl<P: BusPublisher> MessageAction for PublishAction<P> {
    async fn accept(&self, message: &Message) -> ActionResult<()> {
        let body = payload::serialize(message, &self.datetime_format)?;
        self.publisher.publish(&self.topic, body, self.qos).await?;

        info!(
            interface = %message.interface,
            message_id = %message.id,
            topic = %self.topic,
            "Message published"
        );
        Ok(())
    }
}

/// Log the payload instead of publishing it.
#[derive(Debug, Clone)]
pub struct LogAction {
    datetime_format: String,
}

impl LogAction {
    pub fn new(datetime_format: impl Into<String>) -> Self {
        Self {
            datetime_format: datetime_format.into(),
        }
    }
}

#[async_trait]
impl MessageAction for LogAction {
    async fn accept(&self, message: &Message) -> ActionResult<()> {
        let body = payload::serialize(message, &self.datetime_format)?;
        info!(
            interface = %message.interface,
            message_id = %message.id,
            payload = %String::from_utf8_lossy(&body),
            "Accepted message (log only)"
        );
        Ok(())
    }
}
