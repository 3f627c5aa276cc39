//! Compile-time geocoding service configuration.
//!
//! The endpoint, response language and timeout are defined in
//! `services/google_geocoding.toml` and embedded at compile time.

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"google_geocoding"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Endpoint URL.
    pub base_url: String,
    /// Response language hint (e.g., `"zh-TW"`).
    pub language: String,
    /// Region bias as a ccTLD (e.g., `"tw"`).
    #[serde(default)]
    pub region: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

const GOOGLE_GEOCODING_TOML: &str = include_str!("../services/google_geocoding.toml");

/// Returns the embedded Google Geocoding configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded).
#[must_use]
pub fn default_service() -> GeocodingService {
    toml::de::from_str(GOOGLE_GEOCODING_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse geocoding service config: {e}"))
}
