//! The presence aggregate guarded as one unit.

use crate::chat::ChatStore;
use crate::ids::ConnectionId;
use crate::session::{Session, SessionRegistry};

/// Session registry and chat store, mutated together under a single lock.
#[derive(Debug, Default)]
pub struct Presence {
    /// Who is online.
    pub sessions: SessionRegistry,
    /// Per-pair chat threads.
    pub chats: ChatStore,
}

impl Presence {
    /// Create empty presence state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `id` and every thread it takes part in.
    ///
    /// Returns the removed session, or `None` if `id` never joined (in which
    /// case chat state is left untouched).
    pub fn depart(&mut self, id: &ConnectionId) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        let _ = self.chats.remove_all_involving(id);
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;

    #[test]
    fn depart_purges_session_and_threads() {
        let mut p = Presence::new();
        let a = ConnectionId::from("a");
        let b = ConnectionId::from("b");
        let _ = p.sessions.join(a.clone(), "Alice", None);
        let _ = p.sessions.join(b.clone(), "Bob", None);
        let hi = ChatMessage::new(a.clone(), "Alice", b.clone(), "hi");
        p.chats.append(&a, &b, hi);

        let gone = p.depart(&a).unwrap();
        assert_eq!(gone.username, "Alice");
        assert!(p.chats.history(&b, &a).is_empty());
        assert!(p.sessions.contains(&b));
    }

    #[test]
    fn depart_unjoined_is_noop() {
        let mut p = Presence::new();
        assert!(p.depart(&ConnectionId::from("ghost")).is_none());
    }
}
