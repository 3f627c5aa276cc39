#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for house amenity analysis.
//!
//! Defines the fixed amenity [`taxonomy`], coordinate [`geodesy`], the
//! Maps Platform [`credential`], category [`selection`]s, and the
//! [`Place`] / [`House`] records that flow from the facility query engine
//! into the aggregator.

pub mod credential;
pub mod geodesy;
pub mod selection;
pub mod taxonomy;

use serde::{Deserialize, Serialize};

pub use credential::{ApiKey, CredentialError};
pub use geodesy::{Coordinate, haversine};
pub use selection::{Selection, SelectionEntry};
pub use taxonomy::{Category, Taxonomy, TaxonomyEntry};

/// Display key of the bucket for places no selected category claims.
pub const UNCATEGORIZED_KEY: &str = "其他";

/// Color used for [`CategoryTag::Uncategorized`].
pub const UNCATEGORIZED_COLOR: &str = "#7f7f7f";

/// Category assigned to a place at query time.
///
/// Serializes as the category's display key, or [`UNCATEGORIZED_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CategoryTag {
    /// Matched one of the selected taxonomy categories.
    Known(Category),
    /// Found by a keyword that no selected category lists.
    Uncategorized,
}

impl CategoryTag {
    /// Display key (e.g. `"教育"`).
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Known(category) => (*category).into(),
            Self::Uncategorized => UNCATEGORIZED_KEY,
        }
    }

    /// Display color as a hex string.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Known(category) => category.color(),
            Self::Uncategorized => UNCATEGORIZED_COLOR,
        }
    }
}

impl std::fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl From<CategoryTag> for String {
    fn from(tag: CategoryTag) -> Self {
        tag.key().to_string()
    }
}

impl TryFrom<String> for CategoryTag {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == UNCATEGORIZED_KEY {
            return Ok(Self::Uncategorized);
        }
        value.parse().map(Self::Known)
    }
}

/// One deduplicated, radius-filtered, category-tagged search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Category assigned from the keyword that first produced this place.
    pub category: CategoryTag,
    /// Subtype name (or the raw keyword for uncategorized places).
    pub subtype: String,
    /// Query string that produced this place.
    pub keyword: String,
    /// Display name from the search service.
    pub name: String,
    /// Location of the place.
    pub coordinate: Coordinate,
    /// Distance from the search origin, whole meters.
    pub distance_m: u32,
    /// Opaque upstream identifier used for deduplication.
    pub place_id: String,
    /// Formatted address, when the service returned one.
    pub address: Option<String>,
}

/// A property being analyzed, after its address has been geocoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    /// Stable label such as `"House A"`.
    pub label: String,
    /// Listing title.
    pub title: String,
    /// Address as entered.
    pub address: String,
    /// Address as the geocoder resolved it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    /// Geocoded location.
    pub coordinate: Coordinate,
}
