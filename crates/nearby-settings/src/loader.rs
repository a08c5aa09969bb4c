//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`NearbySettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. [`NearbySettings::validate`]
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::NearbySettings;

/// Resolve the default settings file (`~/.nearby/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".nearby").join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. A file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<NearbySettings> {
    let defaults = serde_json::to_value(NearbySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: NearbySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut NearbySettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Invalid values are ignored with a warning (fall back to file/default).
/// `NEARBY_PORT` takes precedence over the bare `PORT`.
pub fn apply_overrides(settings: &mut NearbySettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    // ── Server ──────────────────────────────────────────────────────
    for name in ["PORT", "NEARBY_PORT"] {
        if let Some(val) = read(name) {
            match parse_u16_range(&val, 1, 65535) {
                Some(port) => settings.server.port = port,
                None => tracing::warn!(key = name, value = %val, "invalid port env var, ignoring"),
            }
        }
    }
    if let Some(v) = read("NEARBY_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("NEARBY_CORS_ORIGINS") {
        settings.server.cors_origins = parse_list(&v);
    }
    if let Some(v) = read("NEARBY_STATIC_DIR") {
        settings.server.static_dir = match v.as_str() {
            "none" | "off" => None,
            _ => Some(v),
        };
    }

    // ── Proximity ───────────────────────────────────────────────────
    if let Some(val) = read("NEARBY_SCAN_RADIUS_M") {
        match parse_positive_f64(&val) {
            Some(r) => settings.proximity.default_radius_m = r,
            None => tracing::warn!(value = %val, "invalid NEARBY_SCAN_RADIUS_M, ignoring"),
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("NEARBY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("NEARBY_LOG_FORMAT") {
        settings.logging.format = v.to_ascii_lowercase();
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a strictly positive, finite float.
pub fn parse_positive_f64(val: &str) -> Option<f64> {
    let n: f64 = val.trim().parse().ok()?;
    (n.is_finite() && n > 0.0).then_some(n)
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
