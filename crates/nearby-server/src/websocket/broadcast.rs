//! Event fan-out to connected WebSocket clients.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use nearby_core::ConnectionId;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::connection::ClientConnection;
use super::protocol::OutboundEvent;
use super::transport::Transport;
use crate::metrics::WS_SEND_DROPS_TOTAL;

/// Live connections indexed by connection id.
///
/// Delivery is at-most-once: a frame that does not fit in a client's send
/// buffer is dropped and counted, never retried.
pub struct BroadcastManager {
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
}

impl BroadcastManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let _ = self
            .connections
            .write()
            .insert(connection.id.clone(), connection);
    }

    /// Unregister a connection. Returns it if it was present.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.write().remove(id)
    }

    /// Look up a live connection.
    #[cfg(test)]
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.read().get(id).cloned()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    fn serialize(event: &OutboundEvent) -> Option<Arc<String>> {
        match event.to_json() {
            Ok(json) => Some(Arc::new(json)),
            Err(e) => {
                warn!(event = event.name(), error = %e, "failed to serialize event");
                None
            }
        }
    }

    fn deliver(conn: &ClientConnection, frame: Arc<String>, event: &OutboundEvent) -> bool {
        let sent = conn.send(frame);
        if !sent {
            counter!(WS_SEND_DROPS_TOTAL).increment(1);
            warn!(conn_id = %conn.id, event = event.name(), "send buffer full, dropping event");
        }
        sent
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for BroadcastManager {
    fn emit(&self, to: &ConnectionId, event: &OutboundEvent) -> bool {
        let Some(frame) = Self::serialize(event) else {
            return false;
        };
        let conns = self.connections.read();
        match conns.get(to) {
            Some(conn) => Self::deliver(conn, frame, event),
            None => {
                debug!(conn_id = %to, event = event.name(), "recipient not connected");
                false
            }
        }
    }

    fn broadcast_except(&self, except: &ConnectionId, event: &OutboundEvent) -> usize {
        let Some(frame) = Self::serialize(event) else {
            return 0;
        };
        let conns = self.connections.read();
        let delivered = conns
            .values()
            .filter(|c| &c.id != except)
            .filter(|c| Self::deliver(c, Arc::clone(&frame), event))
            .count();
        debug!(event = event.name(), sent = delivered, "broadcast event");
        delivered
    }
}
