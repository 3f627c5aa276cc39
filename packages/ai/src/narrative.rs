//! Prompt construction for analysis narratives.
//!
//! Prompts are plain markdown digests of an [`AnalysisResult`]: search
//! parameters, per-house statistics, the nearest places, a ranking when
//! several houses are compared, and the buyer profile's focus phrases.

use house_map_amenity_models::{House, Place};
use house_map_analysis::aggregate::{TOP_SUBTYPES, house_stats, rank_result};
use house_map_analysis_models::{AnalysisResult, CategoryCount};
use house_map_profiles::BuyerProfile;

/// Number of nearest places listed per house.
pub const NEAREST_PLACES: usize = 10;

/// System prompt shared by single-house and comparison narratives.
#[must_use]
pub fn system_prompt() -> String {
    format!(
        r"You are a real-estate analyst in Taiwan. You explain what daily life near a property would be like based on the amenity statistics you are given.

## Instructions
1. Use only the numbers provided. Do NOT invent places or statistics.
2. Distances are straight-line meters from the property.
3. When a buyer profile is given, weigh its focus points most heavily.
4. Call out gaps (categories with few or no results) as well as strengths.
5. When several houses are compared, end with a clear recommendation.
6. Answer in Traditional Chinese (zh-TW), formatted as markdown.
7. Today's date is {today}.",
        today = chrono::Utc::now().format("%Y-%m-%d"),
    )
}

fn join_counts(counts: &[CategoryCount]) -> String {
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|c| format!("{} {}", c.name, c.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn search_section(result: &AnalysisResult) -> Vec<String> {
    let categories = result
        .categories
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        "## Search parameters".to_string(),
        format!("- Radius: {} m", result.radius_m),
        format!(
            "- Categories: {}",
            if categories.is_empty() {
                "none"
            } else {
                categories.as_str()
            }
        ),
        format!("- Keywords searched: {}", result.keywords.len()),
    ]
}

fn house_section(result: &AnalysisResult, house: &House) -> Vec<String> {
    let places: &[Place] = result.places_for(&house.label);
    let stats = house_stats(&house.label, places, TOP_SUBTYPES);

    let mut lines = vec![
        String::new(),
        format!("## {}: {}", house.label, house.title),
        format!("- Address: {}", house.address),
    ];
    if let Some(formatted) = &house.formatted_address {
        lines.push(format!("- Located at: {formatted}"));
    }
    lines.push(format!("- Facilities found: {}", stats.facility_count));

    if let Some(nearest) = stats.nearest_m {
        lines.push(format!("- Nearest facility: {nearest} m"));
    }
    if let Some(average) = stats.average_m {
        lines.push(format!("- Average distance: {average:.0} m"));
    }
    lines.push(format!("- By category: {}", join_counts(&stats.by_category)));
    lines.push(format!(
        "- Top {TOP_SUBTYPES} subtypes: {}",
        join_counts(&stats.top_subtypes)
    ));

    if let Some(failed) = result.failed_keywords.get(&house.label) {
        lines.push(format!(
            "- Searches that failed (counts may be low): {}",
            failed.join(", ")
        ));
    }

    if !places.is_empty() {
        lines.push(format!("- Nearest {NEAREST_PLACES} places:"));
        for (i, place) in places.iter().take(NEAREST_PLACES).enumerate() {
            lines.push(format!(
                "  {}. {} ({}, {}, {} m)",
                i + 1,
                place.name,
                place.category,
                place.subtype,
                place.distance_m
            ));
        }
    }

    lines
}

fn profile_section(profile: &BuyerProfile) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!("## Buyer profile: {} {}", profile.icon, profile.name),
        profile.description.clone(),
    ];
    if !profile.focus.is_empty() {
        lines.push("Focus:".to_string());
        lines.extend(profile.focus.iter().map(|f| format!("- {f}")));
    }
    lines
}

/// Prompt asking for a narrative about one house.
///
/// Returns `None` if `label` is not among the analyzed houses.
#[must_use]
pub fn build_single_prompt(
    result: &AnalysisResult,
    label: &str,
    profile: Option<&BuyerProfile>,
) -> Option<String> {
    let house = result.house(label)?;

    let mut lines = search_section(result);
    lines.extend(house_section(result, house));
    if let Some(profile) = profile {
        lines.extend(profile_section(profile));
    }
    lines.push(String::new());
    lines.push("## Task".to_string());
    lines.push(format!(
        "Summarize the living convenience around {}: strengths, weaknesses and who it suits.",
        house.label
    ));

    Some(lines.join("\n"))
}

/// Prompt asking for a comparison of every analyzed house.
///
/// Returns `None` if no house was analyzed.
#[must_use]
pub fn build_comparison_prompt(
    result: &AnalysisResult,
    profile: Option<&BuyerProfile>,
) -> Option<String> {
    if result.houses.is_empty() {
        return None;
    }

    let mut lines = search_section(result);
    for house in &result.houses {
        lines.extend(house_section(result, house));
    }

    lines.push(String::new());
    lines.push("## Ranking by facility count".to_string());
    for ranked in rank_result(result) {
        lines.push(format!(
            "{}. {} ({} facilities)",
            ranked.rank, ranked.label, ranked.facility_count
        ));
    }

    if !result.failures.is_empty() {
        lines.push(String::new());
        lines.push("## Not analyzed".to_string());
        for failure in &result.failures {
            lines.push(format!("- {} ({})", failure.label, failure.address));
        }
    }

    if let Some(profile) = profile {
        lines.extend(profile_section(profile));
    }
    lines.push(String::new());
    lines.push("## Task".to_string());
    lines.push(
        "Compare the houses category by category and recommend the best fit.".to_string(),
    );

    Some(lines.join("\n"))
}
