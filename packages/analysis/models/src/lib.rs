#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the analysis pipeline and aggregator.
//!
//! An [`AnalysisResult`] is rebuilt from scratch on every run. Its
//! `facility_counts`, `places` and `table` are always derived from the same
//! place lists, so `facility_counts[h] == places[h].len()` and the table has
//! exactly `sum(facility_counts)` rows.

use std::collections::BTreeMap;

use house_map_amenity_models::{Category, House, Place};
use serde::{Deserialize, Serialize};

/// A house to analyze, before geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseInput {
    /// Stable label (e.g. `"House A"`).
    pub label: String,
    /// Listing title.
    pub title: String,
    /// Address to geocode.
    pub address: String,
}

/// One row of the flat facilities table: a (house, place) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRow {
    /// House label.
    pub house: String,
    /// Category display key.
    pub category: String,
    /// Subtype name.
    pub subtype: String,
    /// Place name.
    pub name: String,
    /// Distance from the house in meters.
    pub distance_m: u32,
    /// Place latitude.
    pub latitude: f64,
    /// Place longitude.
    pub longitude: f64,
    /// Upstream place identifier.
    pub place_id: String,
    /// Place address, if known.
    pub address: Option<String>,
}

/// A label with a count, used for category and subtype breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category key or subtype name.
    pub name: String,
    /// Number of places.
    pub count: usize,
}

/// Distance statistics and breakdowns for one house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseStats {
    /// House label.
    pub label: String,
    /// Number of places found.
    pub facility_count: usize,
    /// Distance to the nearest place; `None` when nothing was found.
    pub nearest_m: Option<u32>,
    /// Mean distance; `None` when nothing was found.
    pub average_m: Option<f64>,
    /// Places per category, most first.
    pub by_category: Vec<CategoryCount>,
    /// Places per subtype, most first, truncated to the top N.
    pub top_subtypes: Vec<CategoryCount>,
}

/// A house's position in a facility-count ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedHouse {
    /// 1-based rank.
    pub rank: usize,
    /// House label.
    pub label: String,
    /// Number of places found.
    pub facility_count: usize,
}

/// A house whose analysis could not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseFailure {
    /// House label.
    pub label: String,
    /// Address that failed.
    pub address: String,
    /// Why it failed.
    pub reason: String,
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Identifier of the run that produced this result.
    pub run_id: String,
    /// Successfully geocoded houses, in input order.
    pub houses: Vec<House>,
    /// Accepted places per house label, nearest first.
    pub places: BTreeMap<String, Vec<Place>>,
    /// Number of places per house label.
    pub facility_counts: BTreeMap<String, usize>,
    /// Search radius in meters.
    pub radius_m: u32,
    /// Categories that were searched.
    pub categories: Vec<Category>,
    /// Keywords that were searched, in order.
    pub keywords: Vec<String>,
    /// Keywords whose search failed, per house label.
    pub failed_keywords: BTreeMap<String, Vec<String>>,
    /// Houses skipped because geocoding failed.
    pub failures: Vec<HouseFailure>,
    /// Flat (house, place) table, house-major.
    pub table: Vec<FacilityRow>,
}

impl AnalysisResult {
    /// Looks up a house by label.
    #[must_use]
    pub fn house(&self, label: &str) -> Option<&House> {
        self.houses.iter().find(|h| h.label == label)
    }

    /// Places found for `label` (empty if the house is unknown).
    #[must_use]
    pub fn places_for(&self, label: &str) -> &[Place] {
        self.places.get(label).map_or(&[], Vec::as_slice)
    }

    /// Total number of places across all houses.
    #[must_use]
    pub fn total_places(&self) -> usize {
        self.facility_counts.values().sum()
    }

    /// Whether more than one house was analyzed.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        self.houses.len() > 1
    }
}
