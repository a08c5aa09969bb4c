//! Emission seam between the event router and live connections.

use nearby_core::ConnectionId;

use super::protocol::OutboundEvent;

/// Non-blocking delivery of outbound events.
///
/// Implementations must never await or block: the router calls them while
/// holding the presence lock so that emissions for one inbound event are
/// ordered relative to the state change that produced them.
pub trait Transport: Send + Sync {
    /// Send to one connection. Returns `true` if the frame was queued.
    fn emit(&self, to: &ConnectionId, event: &OutboundEvent) -> bool;

    /// Send to every live connection except `except`. Returns the number
    /// of connections the frame was queued for.
    fn broadcast_except(&self, except: &ConnectionId, event: &OutboundEvent) -> usize;
}
