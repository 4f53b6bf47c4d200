//! Message bus side of keensms.
//!
//! [`BusPublisher`] is what the engine publishes through. [`MqttPublisher`]
//! implements it over MQTT, and [`ParkedSubscription`] keeps a persistent
//! subscriber session registered at the broker so messages published while
//! no consumer is online are queued instead of dropped.

pub mod error;
pub mod mqtt;
pub mod parked;
pub mod publisher;

pub use error::{BusError, BusResult};
pub use mqtt::{qos_from_level, BrokerConfig, MqttPublisher};
pub use parked::{park_once, ParkSettings, ParkedSubscription};
pub use publisher::BusPublisher;
