//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use nearby_settings::NearbySettings;
use serde::{Deserialize, Serialize};

use crate::websocket::router::ScanConfig;

/// Runtime configuration for [`crate::NearbyServer`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Origins allowed by CORS. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Directory served for unmatched paths.
    pub static_dir: Option<PathBuf>,
    /// Heartbeat interval in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Close a connection after this long without inbound activity.
    pub heartbeat_timeout_ms: u64,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Per-connection outbound queue depth.
    pub send_buffer_size: usize,
    /// Scan radius used when a request has none.
    pub default_radius_m: f64,
    /// Largest radius a client may request.
    pub max_radius_m: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".into()],
            static_dir: None,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 60_000,
            max_message_size: 64 * 1024,
            send_buffer_size: 256,
            default_radius_m: nearby_core::DEFAULT_RADIUS_M,
            max_radius_m: 50_000.0,
        }
    }
}

impl ServerConfig {
    /// Map loaded settings onto a server config.
    pub fn from_settings(settings: &NearbySettings) -> Self {
        let server = &settings.server;
        Self {
            host: server.host.clone(),
            port: server.port,
            cors_origins: server.cors_origins.clone(),
            static_dir: server.static_dir.as_ref().map(PathBuf::from),
            heartbeat_interval_ms: server.heartbeat_interval_ms,
            heartbeat_timeout_ms: server.heartbeat_timeout_ms,
            max_message_size: server.max_message_size,
            send_buffer_size: server.send_buffer_size,
            default_radius_m: settings.proximity.default_radius_m,
            max_radius_m: settings.proximity.max_radius_m,
        }
    }

    /// `host:port` bind string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Interval between server Ping frames.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Inactivity limit before a connection is closed.
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    /// Radius policy for the event router.
    pub fn scan(&self) -> ScanConfig {
        ScanConfig {
            default_radius_m: self.default_radius_m,
            max_radius_m: self.max_radius_m,
        }
    }
}
