//! Session registry: who is online, under what name, and where.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::ids::ConnectionId;

/// Server-side record of one joined connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Connection identity assigned at connect time.
    pub id: ConnectionId,
    /// Display name supplied at join; not unique, not validated.
    pub username: String,
    /// Last known location, absent until the client reports one.
    pub location: Option<Location>,
    /// True from join until disconnect.
    pub is_online: bool,
    /// When the session was created.
    pub joined_at: DateTime<Utc>,
}

/// Projection served by `GET /api/users`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Connection identity.
    pub id: ConnectionId,
    /// Display name.
    pub username: String,
    /// Online flag.
    pub is_online: bool,
}

/// Exclusive owner of every [`Session`].
///
/// Iteration follows insertion order; removal preserves the order of the
/// remaining sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: IndexMap<ConnectionId, Session>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the session for `id`.
    ///
    /// Returns a copy of the stored session.
    pub fn join(
        &mut self,
        id: ConnectionId,
        username: impl Into<String>,
        location: Option<Location>,
    ) -> Session {
        let session = Session {
            id: id.clone(),
            username: username.into(),
            location,
            is_online: true,
            joined_at: Utc::now(),
        };
        let _ = self.sessions.insert(id, session.clone());
        session
    }

    /// Replace the location of `id`. Unknown ids are ignored.
    ///
    /// Returns `true` if a session was updated.
    pub fn update_location(&mut self, id: &ConnectionId, location: Location) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) => {
                session.location = Some(location);
                true
            }
            None => false,
        }
    }

    /// Look up a session.
    pub fn get(&self, id: &ConnectionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Whether `id` has joined.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Delete the session for `id`, returning it if present.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Session> {
        self.sessions.shift_remove(id)
    }

    /// All sessions other than `id` that have a location.
    pub fn list_online_except<'a>(
        &'a self,
        id: &ConnectionId,
    ) -> impl Iterator<Item = &'a Session> + use<'a> {
        let id = id.clone();
        self.sessions
            .values()
            .filter(move |s| s.id != id && s.location.is_some())
    }

    /// Every session, in join order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// `(id, username, isOnline)` for every session.
    pub fn summaries(&self) -> Vec<UserSummary> {
        self.sessions
            .values()
            .map(|s| UserSummary {
                id: s.id.clone(),
                username: s.username.clone(),
                is_online: s.is_online,
            })
            .collect()
    }

    /// Number of joined sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has joined.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
