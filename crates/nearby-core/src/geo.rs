//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::errors::PresenceError;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude, `-90..=90`.
    pub lat: f64,
    /// Longitude, `-180..=180`.
    pub lon: f64,
}

impl Location {
    /// Create a location without validating it.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject coordinates that would make distance math meaningless.
    pub fn validate(self) -> Result<Self, PresenceError> {
        let in_range = self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon);
        if in_range {
            Ok(self)
        } else {
            Err(PresenceError::InvalidLocation {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }

    /// Great-circle distance to `other` in meters.
    #[must_use]
    pub fn distance_m(&self, other: &Location) -> f64 {
        distance_km(self, other) * 1000.0
    }
}

/// Haversine great-circle distance in kilometers.
///
/// Symmetric, zero for identical points. The `atan2` form stays stable for
/// coincident and antipodal points; `a` is clamped to `[0, 1]` so rounding
/// error near the antipode cannot produce `NaN`.
#[must_use]
pub fn distance_km(a: &Location, b: &Location) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn coincident_points_are_zero() {
        let p = Location::new(40.0, -74.0);
        assert!(distance_km(&p, &p).abs() < EPS);
    }

    #[test]
    fn fifty_five_meters_north() {
        let alice = Location::new(40.0, -74.0);
        let bob = Location::new(40.0005, -74.0);
        let m = alice.distance_m(&bob);
        assert!((55.0..=56.5).contains(&m), "got {m}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(1.0, 0.0);
        let km = distance_km(&a, &b);
        assert!((km - 111.195).abs() < 0.01, "got {km}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(0.0, 180.0);
        let km = distance_km(&a, &b);
        assert!(km.is_finite());
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn pole_to_pole() {
        let north = Location::new(90.0, 0.0);
        let south = Location::new(-90.0, 45.0);
        let km = distance_km(&north, &south);
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn validate_accepts_bounds() {
        assert!(Location::new(90.0, 180.0).validate().is_ok());
        assert!(Location::new(-90.0, -180.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert_matches!(
            Location::new(90.5, 0.0).validate(),
            Err(PresenceError::InvalidLocation { .. })
        );
        assert_matches!(
            Location::new(0.0, -180.5).validate(),
            Err(PresenceError::InvalidLocation { .. })
        );
    }

    #[test]
    fn validate_rejects_non_finite() {
        assert!(Location::new(f64::NAN, 0.0).validate().is_err());
        assert!(Location::new(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn location_wire_shape() {
        let json = serde_json::to_value(Location::new(1.5, -2.5)).unwrap();
        assert_eq!(json, serde_json::json!({"lat": 1.5, "lon": -2.5}));
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let p = Location::new(lat1, lon1);
            let q = Location::new(lat2, lon2);
            prop_assert!((distance_km(&p, &q) - distance_km(&q, &p)).abs() < EPS);
        }

        #[test]
        fn distance_to_self_is_zero(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let p = Location::new(lat, lon);
            prop_assert!(distance_km(&p, &p).abs() < EPS);
        }

        #[test]
        fn distance_is_bounded(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let d = distance_km(&Location::new(lat1, lon1), &Location::new(lat2, lon2));
            prop_assert!(d.is_finite());
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
