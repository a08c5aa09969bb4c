//! Wire protocol: JSON event envelopes in both directions.
//!
//! Every frame is a single JSON object `{"event": <name>, "data": <payload>}`.
//! Inbound frames are parsed in two steps: first the envelope, then the
//! payload for the named event. Locations are validated here so the router
//! only ever sees well-formed coordinates.

use nearby_core::{ChatMessage, ConnectionId, Location, NearbyUser, PresenceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Inbound event names.
pub mod events {
    /// Register the connection as a user.
    pub const USER_JOIN: &str = "user-join";
    /// Request users within a radius.
    pub const SCAN_USERS: &str = "scan-users";
    /// Relay a chat message.
    pub const SEND_MESSAGE: &str = "send-message";
    /// Fetch the thread with another user.
    pub const GET_CHAT_HISTORY: &str = "get-chat-history";
    /// Replace the sender's location.
    pub const UPDATE_LOCATION: &str = "update-location";
}

/// Errors from decoding an inbound frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame was not a JSON envelope.
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// Envelope named an event the server does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Payload did not match the event's shape.
    #[error("invalid payload for {event}: {source}")]
    Payload {
        /// Event name from the envelope.
        event: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Payload carried out-of-range coordinates.
    #[error(transparent)]
    Location(#[from] PresenceError),
}

impl ProtocolError {
    /// Short label for the `reason` metric dimension.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Envelope(_) => "malformed_envelope",
            Self::UnknownEvent(_) => "unknown_event",
            Self::Payload { .. } => "invalid_payload",
            Self::Location(e) => e.category(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// `user-join` payload.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinRequest {
    /// Display name; empty when the client sent none.
    pub username: String,
    /// Initial location, if the client has one.
    pub location: Option<Location>,
}

#[derive(Deserialize)]
struct RawJoin {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    location: Option<Location>,
}

/// `scan-users` payload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ScanRequest {
    /// Origin latitude.
    pub lat: f64,
    /// Origin longitude.
    pub lon: f64,
    /// Requested radius in meters.
    #[serde(default)]
    pub radius: Option<f64>,
}

impl ScanRequest {
    /// Scan origin.
    pub fn origin(&self) -> Location {
        Location::new(self.lat, self.lon)
    }
}

/// `send-message` payload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Recipient connection.
    pub to_user_id: ConnectionId,
    /// Message text.
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryTarget {
    Bare(ConnectionId),
    Object {
        #[serde(rename = "otherUserId")]
        id: ConnectionId,
    },
}

/// A decoded inbound event.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundEvent {
    /// `user-join`
    UserJoin(JoinRequest),
    /// `scan-users`; `None` when the client sent no location.
    ScanUsers(Option<ScanRequest>),
    /// `send-message`
    SendMessage(SendMessageRequest),
    /// `get-chat-history` with the other participant's id.
    GetChatHistory(ConnectionId),
    /// `update-location`
    UpdateLocation(Location),
}

impl InboundEvent {
    /// Decode one text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Envelope)?;
        let data = envelope.data;

        let event = match envelope.event.as_str() {
            events::USER_JOIN => {
                let raw: RawJoin = decode(events::USER_JOIN, data)?;
                let location = raw.location.map(Location::validate).transpose()?;
                Self::UserJoin(JoinRequest {
                    username: raw.username.unwrap_or_default(),
                    location,
                })
            }
            events::SCAN_USERS => {
                let scan: Option<ScanRequest> = decode(events::SCAN_USERS, data)?;
                if let Some(s) = &scan {
                    let _ = s.origin().validate()?;
                }
                Self::ScanUsers(scan)
            }
            events::SEND_MESSAGE => Self::SendMessage(decode(events::SEND_MESSAGE, data)?),
            events::GET_CHAT_HISTORY => {
                let target: HistoryTarget = decode(events::GET_CHAT_HISTORY, data)?;
                Self::GetChatHistory(match target {
                    HistoryTarget::Bare(id) | HistoryTarget::Object { id } => id,
                })
            }
            events::UPDATE_LOCATION => {
                let location: Location = decode(events::UPDATE_LOCATION, data)?;
                Self::UpdateLocation(location.validate()?)
            }
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoin(_) => events::USER_JOIN,
            Self::ScanUsers(_) => events::SCAN_USERS,
            Self::SendMessage(_) => events::SEND_MESSAGE,
            Self::GetChatHistory(_) => events::GET_CHAT_HISTORY,
            Self::UpdateLocation(_) => events::UPDATE_LOCATION,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    event: &'static str,
    data: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::Payload { event, source })
}

/// `user-joined` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserJoined {
    /// Joining connection.
    pub id: ConnectionId,
    /// Display name.
    pub username: String,
    /// Location at join time, `null` if unknown.
    pub location: Option<Location>,
}

/// `chat-history` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    /// The other participant.
    pub other_user_id: ConnectionId,
    /// Thread in append order.
    pub messages: Vec<ChatMessage>,
}

/// `user-location-updated` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationUpdate {
    /// Moving connection.
    pub id: ConnectionId,
    /// New location.
    pub location: Location,
}

/// An event sent from the server to a client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    /// First frame on every connection: the server-assigned id.
    Connected {
        /// Connection identity.
        id: ConnectionId,
    },
    /// Snapshot of other online users, sent to a joiner.
    CurrentUsers(Vec<NearbyUser>),
    /// Someone joined.
    UserJoined(UserJoined),
    /// Scan results, nearest first.
    NearbyUsers(Vec<NearbyUser>),
    /// Inbound chat message.
    ReceiveMessage(ChatMessage),
    /// Echo to the sender after a relay attempt.
    MessageSent(ChatMessage),
    /// Thread with one other user.
    ChatHistory(ChatHistory),
    /// Someone moved.
    UserLocationUpdated(LocationUpdate),
    /// A joined user left; payload is their id.
    UserDisconnected(ConnectionId),
}

impl OutboundEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::CurrentUsers(_) => "current-users",
            Self::UserJoined(_) => "user-joined",
            Self::NearbyUsers(_) => "nearby-users",
            Self::ReceiveMessage(_) => "receive-message",
            Self::MessageSent(_) => "message-sent",
            Self::ChatHistory(_) => "chat-history",
            Self::UserLocationUpdated(_) => "user-location-updated",
            Self::UserDisconnected(_) => "user-disconnected",
        }
    }

    /// Serialize to a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
