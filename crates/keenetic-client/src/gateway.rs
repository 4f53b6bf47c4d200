//! Router operations consumed by the polling engine.

use crate::RouterResult;
use async_trait::async_trait;

/// Name of a mobile interface (modem / SIM slot), e.g. `UsbQmi0`.
pub type InterfaceName = String;

/// Router-assigned SMS identifier, unique within its interface only.
pub type MessageId = String;

/// A mobile interface able to receive SMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: InterfaceName,
    /// Router interface type, e.g. `UsbQmi`.
    pub kind: String,
    pub description: Option<String>,
}

/// One SMS as reported by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub interface: InterfaceName,
    pub sender: String,
    pub text: String,
    /// Router-formatted local time, e.g. `Fri Jan 05 10:20:30 2024`.
    pub timestamp: String,
    pub read: bool,
}

/// SMS operations of a router.
///
/// Every call is a network round trip and may fail with a connectivity or
/// authentication error.
#[async_trait]
pub trait RouterGateway: Send + Sync {
    /// Mobile interfaces, in router order.
    async fn list_interfaces(&self) -> RouterResult<Vec<InterfaceInfo>>;

    /// Messages stored on `interface`, in router order.
    ///
    /// The router may report messages it already considers read; callers
    /// check [`Message::read`].
    async fn list_unread(&self, interface: &str) -> RouterResult<Vec<Message>>;

    /// Mark `ids` as read in a single request.
    async fn mark_as_read(&self, interface: &str, ids: &[MessageId]) -> RouterResult<()>;

    /// Delete `ids` in a single request.
    async fn delete(&self, interface: &str, ids: &[MessageId]) -> RouterResult<()>;
}
