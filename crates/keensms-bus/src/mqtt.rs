//! MQTT publisher.

use crate::error::{BusError, BusResult};
use crate::publisher::BusPublisher;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::time::Duration;
use tracing::{debug, warn};

/// Capacity of the request channel between client and event loop.
pub(crate) const REQUEST_CAPACITY: usize = 10;

/// Upper bound for flushing the DISCONNECT packet.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Broker address and credentials shared by publisher and subscriber.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
}

impl BrokerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            keep_alive: Duration::from_secs(30),
        }
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Connection options for one session of `client_id`.
    pub fn options(&self, client_id: &str, clean_session: bool) -> MqttOptions {
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(clean_session);
        if let Some(username) = &self.username {
            options.set_credentials(
                username.clone(),
                self.password.clone().unwrap_or_default(),
            );
        }
        options
    }
}

/// Map a numeric QoS level.
pub fn qos_from_level(level: u8) -> BusResult<QoS> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(BusError::InvalidQos(other)),
    }
}

/// Whether `event` completes a publish at `qos`.
pub(crate) fn completes_publish(event: &Event, qos: QoS) -> bool {
    matches!(
        (qos, event),
        (QoS::AtMostOnce, Event::Outgoing(Outgoing::Publish(_)))
            | (QoS::AtLeastOnce, Event::Incoming(Packet::PubAck(_)))
            | (QoS::ExactlyOnce, Event::Incoming(Packet::PubComp(_)))
    )
}

/// Drive the event loop until `done` matches an event.
pub(crate) async fn poll_until<F>(eventloop: &mut EventLoop, mut done: F) -> BusResult<()>
where
    F: FnMut(&Event) -> bool,
{
    loop {
        let event = eventloop.poll().await?;
        if done(&event) {
            return Ok(());
        }
    }
}

/// Send DISCONNECT and flush it. Errors are only logged.
pub(crate) async fn close(client: &AsyncClient, eventloop: &mut EventLoop) {
    if let Err(e) = client.disconnect().await {
        debug!(error = %e, "MQTT disconnect request not queued");
        return;
    }

    let flushed = tokio::time::timeout(
        DISCONNECT_TIMEOUT,
        poll_until(eventloop, |event| {
            matches!(event, Event::Outgoing(Outgoing::Disconnect))
        }),
    )
    .await;

    if let Ok(Err(e)) = flushed {
        debug!(error = %e, "MQTT connection closed during disconnect");
    }
}

/// Publishes over a short-lived persistent-session connection per message.
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    broker: BrokerConfig,
    client_id: String,
    ack_timeout: Duration,
}

impl MqttPublisher {
    pub fn new(broker: BrokerConfig, client_id: impl Into<String>, ack_timeout: Duration) -> Self {
        Self {
            broker,
            client_id: client_id.into(),
            ack_timeout,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

#[async_trait]
impl BusPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>, qos: u8) -> BusResult<()> {
        let qos = qos_from_level(qos)?;
        let (client, mut eventloop) =
            AsyncClient::new(self.broker.options(&self.client_id, false), REQUEST_CAPACITY);

        let size = payload.len();
        client.publish(topic, qos, false, payload).await?;

        let acked = tokio::time::timeout(
            self.ack_timeout,
            poll_until(&mut eventloop, |event| completes_publish(event, qos)),
        )
        .await;

        match acked {
            Ok(Ok(())) => {
                close(&client, &mut eventloop).await;
                debug!(topic, size, qos = ?qos, "Message published");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(topic, timeout_secs = self.ack_timeout.as_secs(), "Broker did not acknowledge publish");
                close(&client, &mut eventloop).await;
                Err(BusError::Timeout(self.ack_timeout.as_secs()))
            }
        }
    }
}
