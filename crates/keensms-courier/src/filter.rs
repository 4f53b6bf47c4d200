//! Sender access list.

use keenetic_client::Message;
use std::collections::HashSet;

/// Authorized senders. An empty list accepts nobody.
#[derive(Debug, Clone, Default)]
pub struct AccessList {
    phones: HashSet<String>,
}

impl AccessList {
    pub fn new<I, S>(phones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phones: phones.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact match on the sender as reported by the router.
    pub fn accepts(&self, message: &Message) -> bool {
        self.phones.contains(&message.sender)
    }

    pub fn len(&self) -> usize {
        self.phones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phones.is_empty()
    }
}
