//! Error types for the message bus.

use thiserror::Error;

/// Bus error type.
#[derive(Error, Debug)]
pub enum BusError {
    /// Request could not be queued to the MQTT event loop
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Broker connection failed or dropped
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Broker did not acknowledge in time
    #[error("Timeout waiting for broker acknowledgement after {0} seconds")]
    Timeout(u64),

    /// QoS outside 0..=2
    #[error("Invalid QoS level: {0}")]
    InvalidQos(u8),
}

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;
