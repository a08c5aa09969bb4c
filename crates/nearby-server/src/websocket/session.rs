//! WebSocket session lifecycle: one connected client from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use nearby_core::ConnectionId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::broadcast::BroadcastManager;
use super::connection::ClientConnection;
use super::protocol::{InboundEvent, OutboundEvent};
use super::router::EventRouter;
use crate::config::ServerConfig;
use crate::metrics::{
    EVENTS_REJECTED_TOTAL, WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE,
    WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};

/// How long the writer gets to flush a Close frame after the reader stops.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Per-connection limits.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Interval between server Ping frames.
    pub heartbeat_interval: Duration,
    /// Close after this long without any inbound frame.
    pub heartbeat_timeout: Duration,
    /// Outbound queue depth.
    pub send_buffer_size: usize,
}

impl From<&ServerConfig> for SessionConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            heartbeat_timeout: config.heartbeat_timeout(),
            send_buffer_size: config.send_buffer_size.max(1),
        }
    }
}

/// Run a WebSocket session for a connected client.
///
/// 1. Registers the connection for fan-out
/// 2. Sends a `connected` event carrying the server-assigned id
/// 3. Routes inbound text frames through the [`EventRouter`]
/// 4. Forwards queued outbound frames and sends periodic Pings
/// 5. On close, timeout, or shutdown: unregisters and reports the
///    disconnect to the router
#[instrument(skip_all, fields(conn_id = %conn_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    conn_id: ConnectionId,
    router: Arc<EventRouter>,
    broadcast: Arc<BroadcastManager>,
    config: SessionConfig,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(config.send_buffer_size);
    let connection = Arc::new(ClientConnection::new(conn_id.clone(), send_tx));

    let started = Instant::now();
    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    // Registered before the client learns its id; anything emitted in
    // between waits in the send channel behind the `connected` frame.
    broadcast.add(Arc::clone(&connection));
    let id = conn_id.clone();
    match (OutboundEvent::Connected { id }).to_json() {
        Ok(json) => {
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                debug!("client went away before the connected frame");
            }
        }
        Err(e) => warn!(error = %e, "failed to serialize connected event"),
    }

    // Cancelled by server shutdown, by the writer on a dead socket, or by
    // the reader on close.
    let session_token = shutdown.child_token();

    let writer_conn = Arc::clone(&connection);
    let writer_token = session_token.clone();
    let mut outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(config.heartbeat_interval);
        let _ = ping_interval.tick().await;

        loop {
            tokio::select! {
                () = writer_token.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
                frame = send_rx.recv() => {
                    let Some(text) = frame else { break };
                    if ws_tx.send(Message::Text(text.as_str().to_owned().into())).await.is_err() {
                        break;
                    }
                }
                _ = ping_interval.tick() => {
                    if !writer_conn.check_alive()
                        && writer_conn.last_pong_elapsed() > config.heartbeat_timeout
                    {
                        warn!(timeout = ?config.heartbeat_timeout, "client unresponsive");
                        break;
                    }
                    if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        writer_token.cancel();
    });

    loop {
        let frame = tokio::select! {
            () = session_token.cancelled() => break,
            frame = ws_rx.next() => frame,
        };
        let msg = match frame {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                debug!(error = %e, "websocket read error");
                break;
            }
            None => break,
        };
        connection.mark_alive();

        match msg {
            Message::Text(text) => dispatch(&router, &conn_id, text.as_str()),
            Message::Binary(data) => match std::str::from_utf8(&data) {
                Ok(text) => dispatch(&router, &conn_id, text),
                Err(_) => {
                    warn!(len = data.len(), "rejected non-UTF8 binary frame");
                    counter!(EVENTS_REJECTED_TOTAL, "reason" => "non_utf8").increment(1);
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    session_token.cancel();
    let _ = broadcast.remove(&conn_id);
    let _ = router.disconnect(&conn_id);

    info!(
        dropped = connection.drop_count(),
        age_secs = connection.age().as_secs(),
        "client disconnected"
    );
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    let finished = tokio::time::timeout(CLOSE_GRACE, &mut outbound).await;
    if finished.is_err() {
        outbound.abort();
    }
}

/// Decode one text frame and hand it to the router.
///
/// Frames that fail to decode are logged and counted, never answered.
pub fn dispatch(router: &EventRouter, conn_id: &ConnectionId, text: &str) {
    match InboundEvent::parse(text) {
        Ok(event) => router.handle(conn_id, event),
        Err(e) => {
            warn!(error = %e, "rejected inbound event");
            counter!(EVENTS_REJECTED_TOTAL, "reason" => e.category()).increment(1);
        }
    }
}
