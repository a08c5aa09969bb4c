//! Core error types.

use thiserror::Error;

/// Errors raised by presence-state operations.
///
/// Absent sessions are not errors: operations on unknown ids are silent
/// no-ops. Only input that would poison the distance math is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum PresenceError {
    /// Coordinates are non-finite or outside the valid degree range.
    #[error("invalid location: lat={lat}, lon={lon}")]
    InvalidLocation {
        /// Supplied latitude.
        lat: f64,
        /// Supplied longitude.
        lon: f64,
    },
}

impl PresenceError {
    /// Short category string for logs and metric labels.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidLocation { .. } => "invalid_location",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_location_display() {
        let err = PresenceError::InvalidLocation {
            lat: 91.0,
            lon: 0.0,
        };
        assert_eq!(err.to_string(), "invalid location: lat=91, lon=0");
        assert_eq!(err.category(), "invalid_location");
    }
}
