//! Messages the engine will never act on again.

use keenetic_client::Message;
use std::collections::HashSet;

/// Identity of a message: ids are only unique within their interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub interface: String,
    pub id: String,
}

impl MessageKey {
    pub fn new(interface: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            id: id.into(),
        }
    }

    pub fn of(message: &Message) -> Self {
        Self::new(message.interface.clone(), message.id.clone())
    }
}

/// In-memory, grow-only set of skipped messages.
///
/// Lives for the process lifetime; entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct SkipCache {
    entries: HashSet<MessageKey>,
}

impl SkipCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &MessageKey) -> bool {
        self.entries.contains(key)
    }

    /// Returns `false` if the key was already present.
    pub fn add(&mut self, key: MessageKey) -> bool {
        self.entries.insert(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
