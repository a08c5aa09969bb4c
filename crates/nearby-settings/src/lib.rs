//! # nearby-settings
//!
//! Configuration management with layered sources for the nearby server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`NearbySettings::default()`]
//! 2. **Settings file**: `~/.nearby/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `PORT` and `NEARBY_*` overrides
//!
//! Settings are loaded once at startup and passed down explicitly; there is
//! no global cache.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings_from_path, settings_path,
};
pub use types::*;
