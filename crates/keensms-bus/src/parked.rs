//! Parked subscriber session.
//!
//! A persistent (`clean_session=false`) subscription makes the broker queue
//! messages for the subscriber while it is offline. The real consumer may
//! not have connected yet, so the session is registered here on its behalf
//! and refreshed periodically. Nothing is acknowledged, so queued messages
//! stay for the consumer.

use crate::error::{BusError, BusResult};
use crate::mqtt::{close, poll_until, BrokerConfig, REQUEST_CAPACITY};
use rumqttc::{AsyncClient, Event, Packet, QoS};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Keeps a subscriber session parked at the broker.
///
/// The background task is aborted when the handle is dropped.
#[derive(Debug)]
pub struct ParkedSubscription {
    handle: JoinHandle<()>,
}

/// What to park and how often.
#[derive(Debug, Clone)]
pub struct ParkSettings {
    pub client_id: String,
    pub topic: String,
    pub interval: Duration,
    pub ack_timeout: Duration,
}

impl ParkedSubscription {
    /// Park once and wait for the outcome, then re-park every
    /// `settings.interval` in the background.
    ///
    /// A failed first park is logged and the refresher still starts.
    pub async fn start(broker: BrokerConfig, settings: ParkSettings) -> Self {
        Self::start_with(settings, move |settings| {
            let broker = broker.clone();
            async move { park_once(&broker, &settings).await }
        })
        .await
    }

    /// [`start`](Self::start) with a custom park operation.
    pub async fn start_with<F, Fut>(settings: ParkSettings, park: F) -> Self
    where
        F: Fn(ParkSettings) -> Fut + Send + 'static,
        Fut: Future<Output = BusResult<()>> + Send + 'static,
    {
        info!(
            client_id = %settings.client_id,
            topic = %settings.topic,
            interval_secs = settings.interval.as_secs(),
            "Starting parked subscription"
        );
        log_outcome(&settings, park(settings.clone()).await);

        let handle = tokio::spawn(async move {
            let first = tokio::time::Instant::now() + settings.interval;
            let mut ticker = tokio::time::interval_at(first, settings.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                log_outcome(&settings, park(settings.clone()).await);
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn log_outcome(settings: &ParkSettings, outcome: BusResult<()>) {
    match outcome {
        Ok(()) => debug!(client_id = %settings.client_id, "Subscription parked"),
        Err(e) => warn!(
            client_id = %settings.client_id,
            error = %e,
            "Failed to park subscription, retrying next interval"
        ),
    }
}

impl Drop for ParkedSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Connect, subscribe at QoS 1, wait for SUBACK, disconnect.
pub async fn park_once(broker: &BrokerConfig, settings: &ParkSettings) -> BusResult<()> {
    let mut options = broker.options(&settings.client_id, false);
    options.set_manual_acks(true);

    let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
    client.subscribe(settings.topic.clone(), QoS::AtLeastOnce).await?;

    let subscribed = tokio::time::timeout(
        settings.ack_timeout,
        poll_until(&mut eventloop, |event| {
            matches!(event, Event::Incoming(Packet::SubAck(_)))
        }),
    )
    .await;

    close(&client, &mut eventloop).await;

    match subscribed {
        Ok(result) => result,
        Err(_) => Err(BusError::Timeout(settings.ack_timeout.as_secs())),
    }
}
