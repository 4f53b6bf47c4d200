//! Keenetic router client.
//!
//! Exposes the router as a [`RouterGateway`]: mobile interface discovery,
//! SMS listing, mark-as-read and delete. [`KeeneticClient`] implements it
//! over the router's RCI HTTP API with a cookie session.
//!
//! ```text
//! GET  /auth                 -> 401 + X-NDM-Realm / X-NDM-Challenge
//! POST /auth                 {login, password: sha256(challenge + md5(login:realm:password))}
//! GET  /rci/show/interface   -> interfaces by name
//! POST /rci/                 {"sms": {"list": {"interface": ...}}}
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
pub mod rci;

pub use client::{host_root_url, KeeneticClient, DEFAULT_TIMEOUT};
pub use error::{RouterError, RouterResult};
pub use gateway::{InterfaceInfo, InterfaceName, Message, MessageId, RouterGateway};
