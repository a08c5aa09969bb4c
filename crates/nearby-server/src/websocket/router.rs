//! Event Router: applies inbound events to presence state and emits the
//! resulting outbound events.
//!
//! Each connection moves through `Unjoined → Joined → Closed`. Only
//! `user-join` is meaningful before joining; `scan-users`,
//! `send-message`, and `update-location` from an unjoined connection are
//! ignored. Every inbound event is handled to completion, emissions
//! included, while holding the presence lock, so observers never see an
//! emission that disagrees with the state it describes.

use std::sync::Arc;

use metrics::{counter, gauge};
use nearby_core::{
    ChatMessage, ConnectionId, Location, NearbyUser, Presence, Session, UserSummary, find_nearby,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use super::protocol::{
    ChatHistory, InboundEvent, JoinRequest, LocationUpdate, OutboundEvent, ScanRequest,
    SendMessageRequest, UserJoined,
};
use super::transport::Transport;
use crate::metrics::{
    CHAT_THREADS_ACTIVE, MESSAGES_RELAYED_TOTAL, PRESENCE_SESSIONS_ACTIVE, PROXIMITY_SCANS_TOTAL,
};

/// Where a live connection is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Transport open, no `user-join` yet.
    Unjoined,
    /// Session present in the registry.
    Joined,
}

/// Scan radius policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanConfig {
    /// Radius used when a scan omits one or sends a non-positive value.
    pub default_radius_m: f64,
    /// Upper bound for requested radii.
    pub max_radius_m: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_radius_m: nearby_core::DEFAULT_RADIUS_M,
            max_radius_m: 50_000.0,
        }
    }
}

impl ScanConfig {
    /// Resolve the effective radius for a request.
    pub fn radius(&self, requested: Option<f64>) -> f64 {
        match requested {
            Some(r) if r.is_finite() && r > 0.0 => r.min(self.max_radius_m),
            _ => self.default_radius_m,
        }
    }
}

/// Shared presence state plus the transport it reports through.
pub struct EventRouter {
    presence: Mutex<Presence>,
    transport: Arc<dyn Transport>,
    scan: ScanConfig,
}

impl EventRouter {
    /// Create a router with empty presence state.
    pub fn new(transport: Arc<dyn Transport>, scan: ScanConfig) -> Self {
        Self {
            presence: Mutex::new(Presence::new()),
            transport,
            scan,
        }
    }

    /// Lifecycle phase of a live connection.
    pub fn phase(&self, id: &ConnectionId) -> ConnectionPhase {
        if self.presence.lock().sessions.contains(id) {
            ConnectionPhase::Joined
        } else {
            ConnectionPhase::Unjoined
        }
    }

    /// Apply one inbound event from `from`.
    #[instrument(skip_all, fields(conn_id = %from, event = event.name()))]
    pub fn handle(&self, from: &ConnectionId, event: InboundEvent) {
        let mut presence = self.presence.lock();
        match event {
            InboundEvent::UserJoin(req) => self.on_join(&mut presence, from, req),
            InboundEvent::ScanUsers(req) => self.on_scan(&presence, from, req),
            InboundEvent::SendMessage(req) => self.on_send(&mut presence, from, req),
            InboundEvent::GetChatHistory(other) => self.on_history(&presence, from, other),
            InboundEvent::UpdateLocation(loc) => self.on_update_location(&mut presence, from, loc),
        }
        record_gauges(&presence);
    }

    /// Transport closed for `id`.
    ///
    /// If the connection had joined, its session and every thread it took
    /// part in are removed and the remaining connections are told. An
    /// unjoined connection leaves no trace.
    #[instrument(skip_all, fields(conn_id = %id))]
    pub fn disconnect(&self, id: &ConnectionId) -> Option<Session> {
        let mut presence = self.presence.lock();
        let session = presence.depart(id)?;
        info!(username = %session.username, "user disconnected");
        let _ = self
            .transport
            .broadcast_except(id, &OutboundEvent::UserDisconnected(id.clone()));
        record_gauges(&presence);
        Some(session)
    }

    /// Snapshot of every joined user, in join order.
    pub fn users(&self) -> Vec<UserSummary> {
        self.presence.lock().sessions.summaries()
    }

    /// Number of joined users.
    pub fn active_users(&self) -> usize {
        self.presence.lock().sessions.len()
    }

    /// Number of live chat threads.
    pub fn thread_count(&self) -> usize {
        self.presence.lock().chats.thread_count()
    }

    fn on_join(&self, presence: &mut Presence, from: &ConnectionId, req: JoinRequest) {
        let sessions = &mut presence.sessions;
        let session = sessions.join(from.clone(), req.username, req.location);
        info!(username = %session.username, located = session.location.is_some(), "user joined");

        let others: Vec<NearbyUser> = presence
            .sessions
            .list_online_except(from)
            .filter_map(NearbyUser::placeholder)
            .collect();
        let snapshot = OutboundEvent::CurrentUsers(others);
        let _ = self.transport.emit(from, &snapshot);

        let joined = OutboundEvent::UserJoined(UserJoined {
            id: session.id,
            username: session.username,
            location: session.location,
        });
        let _ = self.transport.broadcast_except(from, &joined);
    }

    fn on_scan(&self, presence: &Presence, from: &ConnectionId, req: Option<ScanRequest>) {
        if !presence.sessions.contains(from) {
            debug!("scan from unjoined connection, ignoring");
            return;
        }
        let found = match req {
            Some(req) => {
                let radius = self.scan.radius(req.radius);
                find_nearby(&presence.sessions, from, req.origin(), radius)
            }
            None => Vec::new(),
        };
        counter!(PROXIMITY_SCANS_TOTAL).increment(1);
        debug!(results = found.len(), "proximity scan");
        let results = OutboundEvent::NearbyUsers(found);
        let _ = self.transport.emit(from, &results);
    }

    fn on_send(&self, presence: &mut Presence, from: &ConnectionId, req: SendMessageRequest) {
        let Some(sender) = presence.sessions.get(from) else {
            debug!("message from unjoined connection, ignoring");
            return;
        };
        let message = ChatMessage::new(
            from.clone(),
            sender.username.clone(),
            req.to_user_id,
            req.message,
        );
        presence.chats.append(from, &message.to, message.clone());
        counter!(MESSAGES_RELAYED_TOTAL).increment(1);

        // A private emit never loops back to the sender.
        if message.to != *from {
            let delivered = self
                .transport
                .emit(&message.to, &OutboundEvent::ReceiveMessage(message.clone()));
            debug!(to = %message.to, delivered, "relayed message");
        }
        let echo = OutboundEvent::MessageSent(message);
        let _ = self.transport.emit(from, &echo);
    }

    fn on_history(&self, presence: &Presence, from: &ConnectionId, other: ConnectionId) {
        let messages = presence.chats.history(from, &other);
        let history = OutboundEvent::ChatHistory(ChatHistory {
            other_user_id: other,
            messages,
        });
        let _ = self.transport.emit(from, &history);
    }

    fn on_update_location(&self, presence: &mut Presence, from: &ConnectionId, location: Location) {
        if !presence.sessions.update_location(from, location) {
            debug!("location update from unjoined connection, ignoring");
            return;
        }
        let update = OutboundEvent::UserLocationUpdated(LocationUpdate {
            id: from.clone(),
            location,
        });
        let _ = self.transport.broadcast_except(from, &update);
    }
}

fn record_gauges(presence: &Presence) {
    gauge!(PRESENCE_SESSIONS_ACTIVE).set(presence.sessions.len() as f64);
    gauge!(CHAT_THREADS_ACTIVE).set(presence.chats.thread_count() as f64);
}
