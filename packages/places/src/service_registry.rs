//! Compile-time place search service configuration.
//!
//! Defined in `services/google_places.toml` and embedded at compile time.
//! `rate_limit_ms` is the minimum delay between consecutive keyword
//! searches issued by the facility query engine.

use std::time::Duration;

use serde::Deserialize;

/// A place search service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesService {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Text search endpoint URL.
    pub base_url: String,
    /// Response language hint.
    pub language: String,
    /// Minimum delay between requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl PlacesService {
    /// The inter-request throttle as a [`Duration`].
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

const GOOGLE_PLACES_TOML: &str = include_str!("../services/google_places.toml");

/// Returns the embedded Google Places configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded).
#[must_use]
pub fn default_service() -> PlacesService {
    toml::de::from_str(GOOGLE_PLACES_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse places service config: {e}"))
}
