#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for house map analysis.
//!
//! Converts a free-form address into a [`Coordinate`] through the
//! [`Geocoder`] trait. The production implementation is
//! [`google::GoogleGeocoder`], configured by the embedded
//! [`service_registry`] TOML and the `GOOGLE_MAPS_API_KEY` variable.
//!
//! A failure means "unknown location": callers skip whatever depended on
//! the coordinate and carry on with other addresses.

pub mod google;
pub mod service_registry;

use house_map_amenity_models::{Coordinate, CredentialError};
use thiserror::Error;

/// A geocoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Resolved location (WGS84).
    pub coordinate: Coordinate,
    /// The canonical address returned by the service.
    pub formatted_address: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The API key is missing or malformed.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-`OK` status.
    #[error("Geocoding failed with status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        /// Status string (e.g. `ZERO_RESULTS`, `OVER_QUERY_LIMIT`).
        status: String,
        /// Explanation from the service, if any.
        message: Option<String>,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Resolves addresses to coordinates.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocodes one address. Only the first match is used.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport failure, a non-`OK` status,
    /// or an unparseable response.
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError>;
}
