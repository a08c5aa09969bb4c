//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Fails if a recorder is
/// already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// WebSocket connection duration seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Outbound frames dropped on a full or closed send buffer (counter).
pub const WS_SEND_DROPS_TOTAL: &str = "ws_send_drops_total";
/// Joined sessions (gauge).
pub const PRESENCE_SESSIONS_ACTIVE: &str = "presence_sessions_active";
/// Live chat threads (gauge).
pub const CHAT_THREADS_ACTIVE: &str = "chat_threads_active";
/// Chat messages relayed (counter).
pub const MESSAGES_RELAYED_TOTAL: &str = "messages_relayed_total";
/// Proximity scans served (counter).
pub const PROXIMITY_SCANS_TOTAL: &str = "proximity_scans_total";
/// Inbound frames rejected (counter, labels: reason).
pub const EVENTS_REJECTED_TOTAL: &str = "events_rejected_total";

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::counter;

    #[test]
    fn render_includes_recorded_counter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            counter!(MESSAGES_RELAYED_TOTAL).increment(3);
        });
        let output = render(&handle);
        assert!(output.contains("messages_relayed_total 3"));
    }

    #[test]
    fn metric_names_are_snake_case() {
        for name in [
            WS_CONNECTIONS_TOTAL,
            WS_DISCONNECTIONS_TOTAL,
            WS_CONNECTIONS_ACTIVE,
            WS_CONNECTION_DURATION_SECONDS,
            WS_SEND_DROPS_TOTAL,
            PRESENCE_SESSIONS_ACTIVE,
            CHAT_THREADS_ACTIVE,
            MESSAGES_RELAYED_TOTAL,
            PROXIMITY_SCANS_TOTAL,
            EVENTS_REJECTED_TOTAL,
        ] {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "{name}"
            );
        }
    }
}
