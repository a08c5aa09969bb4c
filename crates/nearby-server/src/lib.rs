//! # nearby-server
//!
//! Axum HTTP + `WebSocket` server for real-time presence and proximity
//! messaging.
//!
//! - `WebSocket` gateway at `/ws`: connection lifecycle, heartbeat, JSON
//!   event envelopes
//! - [`websocket::router::EventRouter`]: per-event state machine over the
//!   shared presence state
//! - [`websocket::broadcast::BroadcastManager`]: unicast and
//!   broadcast-except fan-out
//! - HTTP endpoints: `/api/users`, `/api/health`, `/metrics`, static assets
//! - Graceful shutdown via `CancellationToken`
//!
//! ## Crate Position
//!
//! Depends on: nearby-core, nearby-settings. Depended on by: nearby.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::NearbyServer;
