//! WebSocket connection management, event routing, and broadcasting.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `protocol` | Inbound/outbound event envelopes and payload parsing |
//! | `transport` | `Transport` trait: unicast + broadcast-except emission |
//! | `connection` | Per-connection send channel and liveness state |
//! | `broadcast` | Connection map implementing `Transport` |
//! | `router` | Event Router: presence state machine per inbound event |
//! | `session` | WebSocket read/write loops from upgrade through disconnect |
//!
//! ## Data Flow
//!
//! `session` → `protocol::InboundEvent::parse` → `router` (under the
//! presence lock) → `transport` → `connection` send channels → `session`
//! writer task.

pub mod broadcast;
pub mod connection;
pub mod protocol;
pub mod router;
pub mod session;
pub mod transport;
