//! Profile registry: loads every buyer profile from embedded TOML.
//!
//! Each `.toml` file in `packages/profiles/profiles/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a persona means
//! adding a file and listing it below.

use std::collections::BTreeMap;

use crate::BuyerProfile;

/// TOML presets embedded at compile time, in menu order.
const PROFILE_TOMLS: &[(&str, &str)] = &[
    (
        "first_time_buyer",
        include_str!("../profiles/first_time_buyer.toml"),
    ),
    ("family", include_str!("../profiles/family.toml")),
    ("retiree", include_str!("../profiles/retiree.toml")),
    ("commuter", include_str!("../profiles/commuter.toml")),
    ("investor", include_str!("../profiles/investor.toml")),
];

#[cfg(test)]
const EXPECTED_PROFILE_COUNT: usize = 5;

/// Returns all profiles in menu order.
///
/// # Panics
///
/// Panics if any TOML preset is malformed (this is a compile-time guarantee
/// since the presets are embedded).
#[must_use]
pub fn all_profiles() -> Vec<BuyerProfile> {
    PROFILE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse buyer profile '{name}': {e}"))
        })
        .collect()
}

/// Returns all profiles keyed by id.
#[must_use]
pub fn profiles() -> BTreeMap<String, BuyerProfile> {
    all_profiles()
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect()
}
