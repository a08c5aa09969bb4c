//! # nearby-core
//!
//! In-memory presence state for the nearby server.
//!
//! - **Ids**: [`ids::ConnectionId`] branded newtype, UUID v7 per connection
//! - **Geo**: [`geo::Location`] and haversine [`geo::distance_km`]
//! - **Sessions**: [`session::SessionRegistry`] owns every [`session::Session`]
//! - **Proximity**: [`proximity::find_nearby`] linear radius scan
//! - **Chat**: [`chat::ChatStore`] per-pair append-only threads
//! - **Presence**: [`presence::Presence`] bundles registry and chat store
//!   behind one lock
//! - **Errors**: [`errors::PresenceError`]
//! - **Logging**: [`logging::init_subscriber`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by nearby-server and the nearby binary.

#![deny(unsafe_code)]

pub mod chat;
pub mod errors;
pub mod geo;
pub mod ids;
pub mod logging;
pub mod presence;
pub mod proximity;
pub mod session;

pub use chat::{ChatMessage, ChatStore, ThreadKey};
pub use errors::PresenceError;
pub use geo::{Location, distance_km};
pub use ids::ConnectionId;
pub use logging::{LogFormat, init_subscriber};
pub use presence::Presence;
pub use proximity::{DEFAULT_RADIUS_M, NearbyUser, find_nearby};
pub use session::{Session, SessionRegistry, UserSummary};
