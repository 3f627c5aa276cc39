//! Plain-text rendering of analysis results.

use std::fmt::Write as _;

use house_map_analysis::aggregate::{rank_result, result_stats};
use house_map_analysis_models::{AnalysisResult, CategoryCount, HouseStats};

fn counts(list: &[CategoryCount]) -> String {
    list.iter()
        .map(|c| format!("{} {}", c.name, c.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn distance(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |m| format!("{m} m"))
}

fn write_stats(
    out: &mut String,
    stats: &HouseStats,
    located_at: Option<&str>,
    failed: Option<&Vec<String>>,
) -> std::fmt::Result {
    writeln!(out, "{}", stats.label)?;
    if let Some(located_at) = located_at {
        writeln!(out, "  Located at:  {located_at}")?;
    }
    writeln!(out, "  Facilities:  {}", stats.facility_count)?;
    writeln!(out, "  Nearest:     {}", distance(stats.nearest_m))?;
    writeln!(
        out,
        "  Average:     {}",
        stats
            .average_m
            .map_or_else(|| "-".to_string(), |m| format!("{m:.0} m"))
    )?;
    if !stats.by_category.is_empty() {
        writeln!(out, "  Categories:  {}", counts(&stats.by_category))?;
        writeln!(out, "  Top types:   {}", counts(&stats.top_subtypes))?;
    }
    if let Some(failed) = failed {
        writeln!(out, "  Failed searches: {}", failed.join(", "))?;
    }
    Ok(())
}

fn write_result(out: &mut String, result: &AnalysisResult) -> std::fmt::Result {
    writeln!(
        out,
        "Radius {} m, {} keyword(s) per house",
        result.radius_m,
        result.keywords.len()
    )?;

    for stats in result_stats(result) {
        writeln!(out)?;
        let located_at = result
            .house(&stats.label)
            .and_then(|h| h.formatted_address.as_deref());
        write_stats(
            out,
            &stats,
            located_at,
            result.failed_keywords.get(&stats.label),
        )?;
    }

    if result.is_comparison() {
        writeln!(out)?;
        writeln!(out, "Ranking")?;
        for ranked in rank_result(result) {
            writeln!(
                out,
                "  {}. {:<12} {:>4}",
                ranked.rank, ranked.label, ranked.facility_count
            )?;
        }
    }

    if !result.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Not analyzed")?;
        for failure in &result.failures {
            writeln!(out, "  {}: {}", failure.label, failure.reason)?;
        }
    }

    Ok(())
}

/// Renders per-house statistics, the ranking and any failures.
#[must_use]
pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_result(&mut out, result);
    out
}
