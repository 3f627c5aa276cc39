#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Buyer persona presets.
//!
//! A [`BuyerProfile`] names a weighted subset of the amenity taxonomy
//! (priority picks first, then secondary picks) and a suggested search
//! radius. [`auto_select`] expands a profile into the concrete
//! [`Selection`] the facility query engine runs.

pub mod registry;

use house_map_amenity_models::{Category, Selection};
use serde::Deserialize;
use thiserror::Error;

pub use registry::{all_profiles, profiles};

/// Errors from profile lookup.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No profile has this id.
    #[error("Unknown buyer profile: {id}")]
    Unknown {
        /// The id that was requested.
        id: String,
    },
}

/// Subtypes of one category a profile cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryPick {
    /// Taxonomy category.
    pub category: Category,
    /// Subtype names under that category.
    pub subtypes: Vec<String>,
}

/// A named buyer persona.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuyerProfile {
    /// Stable identifier (e.g. `"family"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Emoji shown next to the name.
    pub icon: String,
    /// One-sentence description of the persona.
    pub description: String,
    /// Suggested search radius in meters.
    pub radius_m: u32,
    /// Analysis focus phrases, most important first.
    pub focus: Vec<String>,
    /// Categories weighted most heavily.
    #[serde(default)]
    pub priority: Vec<CategoryPick>,
    /// Nice-to-have categories.
    #[serde(default)]
    pub secondary: Vec<CategoryPick>,
}

/// Concrete selection derived from a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSelection {
    /// Suggested radius carried over from the profile.
    pub radius_m: u32,
    /// Categories and subtypes to query.
    pub selection: Selection,
}

impl ProfileSelection {
    /// Selected categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.selection.categories()
    }
}

/// Looks up one profile by id.
///
/// # Errors
///
/// Returns [`ProfileError::Unknown`] if no embedded profile has `id`.
pub fn profile(id: &str) -> Result<BuyerProfile, ProfileError> {
    all_profiles()
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ProfileError::Unknown { id: id.to_string() })
}

/// Expands a profile into a selection.
///
/// Priority picks come before secondary picks; a category listed in both
/// keeps its priority position and gains the secondary subtypes. Subtypes
/// not in the taxonomy are dropped silently.
#[must_use]
pub fn expand(profile: &BuyerProfile) -> ProfileSelection {
    let mut selection = Selection::new();
    for pick in profile.priority.iter().chain(&profile.secondary) {
        selection.add(pick.category, &pick.subtypes);
    }

    log::debug!(
        "Profile {} selects {} categories",
        profile.id,
        selection.entries().len()
    );

    ProfileSelection {
        radius_m: profile.radius_m,
        selection,
    }
}

/// Looks up a profile by id and expands it. See [`expand`].
///
/// # Errors
///
/// Returns [`ProfileError::Unknown`] if no embedded profile has `id`.
pub fn auto_select(id: &str) -> Result<ProfileSelection, ProfileError> {
    profile(id).map(|p| expand(&p))
}
