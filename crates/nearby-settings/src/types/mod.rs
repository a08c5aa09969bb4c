//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a settings
//! file may be partial: missing fields get their compiled default.

mod server;

pub use server::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the nearby server.
///
/// # JSON Format
///
/// ```json
/// {
///   "server": { "port": 5000, "corsOrigins": ["http://localhost:3000"] },
///   "proximity": { "defaultRadiusM": 500 },
///   "logging": { "level": "info", "format": "compact" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NearbySettings {
    /// HTTP / WebSocket listener settings.
    pub server: ServerSettings,
    /// Proximity scan settings.
    pub proximity: ProximitySettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl NearbySettings {
    /// Correct values that break invariants.
    ///
    /// Called automatically during loading. Out-of-range values are
    /// corrected with a warning rather than rejected.
    pub fn validate(&mut self) {
        let p = &mut self.proximity;
        if !p.default_radius_m.is_finite() || p.default_radius_m <= 0.0 {
            tracing::warn!(
                value = p.default_radius_m,
                "defaultRadiusM must be positive, using 500"
            );
            p.default_radius_m = 500.0;
        }
        if !p.max_radius_m.is_finite() || p.max_radius_m < p.default_radius_m {
            tracing::warn!(
                max = p.max_radius_m,
                default = p.default_radius_m,
                "maxRadiusM below defaultRadiusM, correcting"
            );
            p.max_radius_m = p.default_radius_m;
        }

        let s = &mut self.server;
        if s.heartbeat_interval_ms == 0 {
            tracing::warn!("heartbeatIntervalMs must be non-zero, using 30000");
            s.heartbeat_interval_ms = 30_000;
        }
        if s.heartbeat_timeout_ms < s.heartbeat_interval_ms {
            tracing::warn!(
                timeout = s.heartbeat_timeout_ms,
                interval = s.heartbeat_interval_ms,
                "heartbeatTimeoutMs < heartbeatIntervalMs, correcting"
            );
            s.heartbeat_timeout_ms = s.heartbeat_interval_ms;
        }
        if s.send_buffer_size == 0 {
            s.send_buffer_size = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = NearbySettings::default();
        assert_eq!(s.server.port, 5000);
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(s.server.static_dir.as_deref(), Some("public"));
        assert!((s.proximity.default_radius_m - 500.0).abs() < f64::EPSILON);
        assert_eq!(s.logging.level, "info");
        assert_eq!(s.logging.format, "compact");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: NearbySettings = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.server.host, "0.0.0.0");
        assert!((s.proximity.max_radius_m - 50_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn camel_case_keys() {
        let json = serde_json::to_value(NearbySettings::default()).unwrap();
        assert!(json["server"]["corsOrigins"].is_array());
        assert!(json["server"]["heartbeatIntervalMs"].is_number());
        assert!(json["proximity"]["defaultRadiusM"].is_number());
    }

    #[test]
    fn validate_raises_max_radius() {
        let mut s = NearbySettings::default();
        s.proximity.default_radius_m = 1000.0;
        s.proximity.max_radius_m = 10.0;
        s.validate();
        assert!((s.proximity.max_radius_m - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_resets_non_positive_radius() {
        let mut s = NearbySettings::default();
        s.proximity.default_radius_m = -5.0;
        s.validate();
        assert!((s.proximity.default_radius_m - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_heartbeat_invariant() {
        let mut s = NearbySettings::default();
        s.server.heartbeat_interval_ms = 20_000;
        s.server.heartbeat_timeout_ms = 5_000;
        s.validate();
        assert_eq!(s.server.heartbeat_timeout_ms, 20_000);
    }

    #[test]
    fn validate_keeps_valid_settings() {
        let mut s = NearbySettings::default();
        s.validate();
        assert_eq!(s.server.heartbeat_timeout_ms, 60_000);
        assert!((s.proximity.max_radius_m - 50_000.0).abs() < f64::EPSILON);
    }
}
