//! `/api/health` endpoint.

use std::time::Instant;

use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"OK"` while the server is running.
    pub status: &'static str,
    /// Joined users.
    pub active_users: usize,
    /// Open WebSocket connections, joined or not.
    pub connections: usize,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

/// Build a health response from live counters.
pub fn health_check(
    start_time: Instant,
    active_users: usize,
    connections: usize,
) -> HealthResponse {
    HealthResponse {
        status: "OK",
        active_users,
        connections,
        uptime_secs: start_time.elapsed().as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn serializes_camel_case() {
        let resp = health_check(Instant::now(), 2, 3);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["activeUsers"], 2);
        assert_eq!(json["connections"], 3);
        assert!(json["uptimeSecs"].as_u64().unwrap() < 2);
    }

    #[test]
    fn uptime_counts_from_start() {
        let start = Instant::now().checked_sub(Duration::from_secs(60)).unwrap();
        assert!(health_check(start, 0, 0).uptime_secs >= 59);
    }
}
