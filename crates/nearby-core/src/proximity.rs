//! Radius scan over the session registry.
//!
//! A linear pass over every joined session: O(N) per query with no spatial
//! index. Distances are rounded half away from zero (`f64::round`) to whole
//! meters, and results are ordered nearest first; ties keep registry order.

use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::ids::ConnectionId;
use crate::session::{Session, SessionRegistry};

/// Scan radius used when the client does not ask for one.
pub const DEFAULT_RADIUS_M: f64 = 500.0;

/// A session found near a query origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearbyUser {
    /// Connection identity.
    pub id: ConnectionId,
    /// Display name.
    pub username: String,
    /// Rounded distance from the origin in meters.
    pub distance: u64,
    /// The session's last known location.
    pub location: Location,
}

impl NearbyUser {
    /// Snapshot entry with a zero placeholder distance.
    ///
    /// Returns `None` for sessions without a location.
    pub fn placeholder(session: &Session) -> Option<Self> {
        Some(Self {
            id: session.id.clone(),
            username: session.username.clone(),
            distance: 0,
            location: session.location?,
        })
    }
}

/// Sessions other than `self_id` within `radius_m` meters of `origin`.
pub fn find_nearby(
    registry: &SessionRegistry,
    self_id: &ConnectionId,
    origin: Location,
    radius_m: f64,
) -> Vec<NearbyUser> {
    let mut found: Vec<NearbyUser> = registry
        .list_online_except(self_id)
        .filter_map(|session| {
            let location = session.location?;
            let distance = origin.distance_m(&location);
            (distance <= radius_m).then(|| NearbyUser {
                id: session.id.clone(),
                username: session.username.clone(),
                distance: distance.round() as u64,
                location,
            })
        })
        .collect();
    found.sort_by_key(|u| u.distance);
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Location = Location::new(40.0, -74.0);
    const BOB: Location = Location::new(40.0005, -74.0);

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    fn registry() -> SessionRegistry {
        let mut reg = SessionRegistry::new();
        let _ = reg.join(id("alice"), "Alice", Some(ALICE));
        let _ = reg.join(id("bob"), "Bob", Some(BOB));
        reg
    }

    fn names(found: &[NearbyUser]) -> Vec<&str> {
        found.iter().map(|u| u.username.as_str()).collect()
    }

    #[test]
    fn alice_finds_bob_within_default_radius() {
        let reg = registry();
        let found = find_nearby(&reg, &id("alice"), ALICE, DEFAULT_RADIUS_M);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "Bob");
        assert_eq!(found[0].distance, 56);
    }

    #[test]
    fn distance_is_symmetric_between_scanners() {
        let reg = registry();
        let from_alice = find_nearby(&reg, &id("alice"), ALICE, DEFAULT_RADIUS_M);
        let from_bob = find_nearby(&reg, &id("bob"), BOB, DEFAULT_RADIUS_M);
        assert_eq!(from_bob.len(), 1);
        assert_eq!(from_bob[0].username, "Alice");
        assert_eq!(from_alice[0].distance, from_bob[0].distance);
    }

    #[test]
    fn excludes_self() {
        let reg = registry();
        let found = find_nearby(&reg, &id("alice"), ALICE, 1_000_000.0);
        assert!(found.iter().all(|u| u.id != id("alice")));
    }

    #[test]
    fn excludes_sessions_outside_radius() {
        let reg = registry();
        let found = find_nearby(&reg, &id("alice"), ALICE, 50.0);
        assert!(found.is_empty());
    }

    #[test]
    fn boundary_is_inclusive() {
        let reg = registry();
        let exact = ALICE.distance_m(&BOB);
        let found = find_nearby(&reg, &id("alice"), ALICE, exact);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn skips_sessions_without_location() {
        let mut reg = registry();
        let _ = reg.join(id("carol"), "Carol", None);
        let found = find_nearby(&reg, &id("alice"), ALICE, 1_000_000.0);
        assert!(found.iter().all(|u| u.username != "Carol"));
    }

    #[test]
    fn results_are_sorted_nearest_first() {
        let mut reg = SessionRegistry::new();
        let _ = reg.join(id("far"), "Far", Some(Location::new(40.003, -74.0)));
        let _ = reg.join(id("near"), "Near", Some(Location::new(40.001, -74.0)));
        let _ = reg.join(id("mid"), "Mid", Some(Location::new(40.002, -74.0)));
        let found = find_nearby(&reg, &id("me"), ALICE, DEFAULT_RADIUS_M);
        assert_eq!(names(&found), vec!["Near", "Mid", "Far"]);
    }

    #[test]
    fn ties_keep_registry_order() {
        let mut reg = SessionRegistry::new();
        let _ = reg.join(id("z"), "Zed", Some(ALICE));
        let _ = reg.join(id("a"), "Ann", Some(ALICE));
        let found = find_nearby(&reg, &id("me"), ALICE, DEFAULT_RADIUS_M);
        assert_eq!(names(&found), vec!["Zed", "Ann"]);
    }

    #[test]
    fn placeholder_requires_location() {
        let mut reg = SessionRegistry::new();
        let located = reg.join(id("a"), "Ann", Some(Location::new(1.0, 1.0)));
        let unlocated = reg.join(id("b"), "Ben", None);
        let entry = NearbyUser::placeholder(&located).unwrap();
        assert_eq!(entry.distance, 0);
        assert!(NearbyUser::placeholder(&unlocated).is_none());
    }
}
