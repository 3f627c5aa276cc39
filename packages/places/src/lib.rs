#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Nearby amenity discovery.
//!
//! [`PlaceSearch`] abstracts a single keyword search around a coordinate;
//! [`google::GooglePlacesClient`] implements it against the Places Text
//! Search API. The [`engine`] fans one search out per selected keyword,
//! strictly one after another with a throttle in between, and merges the
//! rows into a deduplicated, radius-filtered, category-tagged list.

pub mod engine;
pub mod google;
pub mod progress;
pub mod service_registry;

use house_map_amenity_models::{Coordinate, CredentialError};
use thiserror::Error;

pub use engine::{
    FacilityQuery, FacilityQueryEngine, FacilityReport, KeywordOutcome, KeywordStatus,
    KeywordTask, QueryError, plan_tasks,
};

/// Errors from a single keyword search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The API key is missing or malformed.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-`OK` status.
    #[error("Place search failed with status {status}")]
    Status {
        /// Status string (e.g. `OVER_QUERY_LIMIT`, `INVALID_REQUEST`).
        status: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// One keyword search centered on a coordinate.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Query string, sent verbatim.
    pub keyword: &'a str,
    /// Search center.
    pub origin: Coordinate,
    /// Radius hint in meters. Advisory only for text search.
    pub radius_m: u32,
}

/// A result row as returned by the search service, before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlace {
    /// Opaque place identifier.
    pub place_id: String,
    /// Display name.
    pub name: String,
    /// Location.
    pub coordinate: Coordinate,
    /// Formatted address or vicinity, if present.
    pub address: Option<String>,
}

/// Searches for places matching a keyword near a coordinate.
///
/// Only the first page of results is consumed.
#[async_trait::async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Runs one search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport failure, a non-`OK` status, or
    /// an unparseable response.
    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawPlace>, SearchError>;
}
