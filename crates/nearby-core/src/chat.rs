//! Per-pair chat threads.
//!
//! A thread is keyed by the unordered pair of participants and holds every
//! message exchanged since either participant's most recent join. Threads
//! are created on first append and dropped when either side disconnects.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ConnectionId;

/// One relayed message. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Sender identity.
    pub from: ConnectionId,
    /// Sender's username at send time.
    pub from_username: String,
    /// Recipient identity; may already be disconnected.
    pub to: ConnectionId,
    /// Opaque payload.
    pub message: String,
    /// Send time.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a message stamped with the current time.
    pub fn new(
        from: ConnectionId,
        from_username: impl Into<String>,
        to: ConnectionId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            from,
            from_username: from_username.into(),
            to,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Canonical key for the unordered pair `{a, b}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    low: ConnectionId,
    high: ConnectionId,
}

impl ThreadKey {
    /// Order the two ids so `(a, b)` and `(b, a)` produce the same key.
    pub fn new(a: &ConnectionId, b: &ConnectionId) -> Self {
        if a <= b {
            Self {
                low: a.clone(),
                high: b.clone(),
            }
        } else {
            Self {
                low: b.clone(),
                high: a.clone(),
            }
        }
    }

    /// Whether `id` is one of the two participants.
    pub fn involves(&self, id: &ConnectionId) -> bool {
        &self.low == id || &self.high == id
    }
}

/// All live chat threads.
#[derive(Debug, Default)]
pub struct ChatStore {
    threads: HashMap<ThreadKey, Vec<ChatMessage>>,
}

impl ChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` to the `{a, b}` thread, creating it if needed.
    pub fn append(&mut self, a: &ConnectionId, b: &ConnectionId, message: ChatMessage) {
        self.threads
            .entry(ThreadKey::new(a, b))
            .or_default()
            .push(message);
    }

    /// Messages of the `{a, b}` thread in send order; empty if none.
    pub fn history(&self, a: &ConnectionId, b: &ConnectionId) -> Vec<ChatMessage> {
        self.threads
            .get(&ThreadKey::new(a, b))
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every thread `id` takes part in. Returns how many were removed.
    pub fn remove_all_involving(&mut self, id: &ConnectionId) -> usize {
        let before = self.threads.len();
        self.threads.retain(|key, _| !key.involves(id));
        before - self.threads.len()
    }

    /// Number of live threads.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}
