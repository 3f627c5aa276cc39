//! Non-interactive analysis runs.
//!
//! Turns command-line arguments (or interactive answers) into an
//! [`AnalysisRequest`], then geocodes, searches, prints, exports and
//! optionally narrates in one pass.

use std::path::PathBuf;

use house_map_ai::{Narration, Narrator, create_provider_from_env};
use house_map_amenity_models::{Category, Selection};
use house_map_analysis::AnalysisContext;
use house_map_analysis::export::export_facilities_csv;
use house_map_analysis_models::HouseInput;
use house_map_cli_utils::{IndicatifProgress, MultiProgress};
use house_map_geocoder::google::GoogleGeocoder;
use house_map_places::google::GooglePlacesClient;
use house_map_profiles::BuyerProfile;

use crate::report;

/// Radius used when neither a flag nor a profile supplies one.
pub const DEFAULT_RADIUS_M: u32 = 1000;

/// Largest radius the place search accepts.
pub const MAX_RADIUS_M: u32 = 50_000;

/// Arguments of the `analyze` subcommand.
#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// Addresses to analyze; two or more are compared
    #[arg(required = true)]
    addresses: Vec<String>,

    /// Label for each address, in order (default: House A, House B, ...)
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Buyer profile id (see `house_map profiles`)
    #[arg(long)]
    profile: Option<String>,

    /// Search radius in meters (overrides the profile's suggestion)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RADIUS_M)))]
    radius: Option<u32>,

    /// Category to search, by Chinese key or English name (overrides the profile)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Extra free-text keyword searched after the selected subtypes
    #[arg(long)]
    extra_keyword: Option<String>,

    /// Write the facilities table to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Ask the configured AI provider for a narrative
    #[arg(long)]
    narrate: bool,
}

/// Everything one analysis run needs.
pub struct AnalysisRequest {
    pub houses: Vec<HouseInput>,
    pub selection: Selection,
    pub radius_m: u32,
    pub extra_keyword: Option<String>,
    pub profile: Option<BuyerProfile>,
    pub export: Option<PathBuf>,
    pub narrate: bool,
}

impl AnalyzeArgs {
    /// Resolves profile, categories and labels into a request.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown profile or category, or more labels
    /// than addresses.
    pub fn into_request(self) -> Result<AnalysisRequest, Box<dyn std::error::Error>> {
        let profile = self
            .profile
            .as_deref()
            .map(house_map_profiles::profile)
            .transpose()?;

        let selection = if self.categories.is_empty() {
            profile.as_ref().map_or_else(
                || {
                    log::info!("No profile or categories given; searching every category");
                    Selection::whole_categories(Category::ALL)
                },
                |p| house_map_profiles::expand(p).selection,
            )
        } else {
            Selection::whole_categories(&parse_categories(&self.categories)?)
        };

        let radius_m = self
            .radius
            .or_else(|| profile.as_ref().map(|p| p.radius_m))
            .unwrap_or(DEFAULT_RADIUS_M);

        Ok(AnalysisRequest {
            houses: house_inputs(&self.addresses, &self.labels)?,
            selection,
            radius_m,
            extra_keyword: self.extra_keyword,
            profile,
            export: self.export,
            narrate: self.narrate,
        })
    }
}

/// Parses one category by Chinese key (`教育`) or English name (`education`).
#[must_use]
pub fn parse_category(value: &str) -> Option<Category> {
    let value = value.trim();
    value.parse::<Category>().ok().or_else(|| {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.english_name().eq_ignore_ascii_case(value))
    })
}

fn parse_categories(values: &[String]) -> Result<Vec<Category>, String> {
    values
        .iter()
        .map(|v| parse_category(v).ok_or_else(|| format!("Unknown category: {v}")))
        .collect()
}

/// Parses a typed radius, accepting `1..=MAX_RADIUS_M` meters.
///
/// # Errors
///
/// Returns an error for non-numeric input or a radius outside the range.
pub fn parse_radius(value: &str) -> Result<u32, String> {
    let radius_m: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("Not a radius in meters: {value}"))?;
    if !(1..=MAX_RADIUS_M).contains(&radius_m) {
        return Err(format!(
            "Radius must be between 1 and {MAX_RADIUS_M} meters, got {radius_m}"
        ));
    }
    Ok(radius_m)
}

/// Default label for the house at `index`: `House A` .. `House Z`, then
/// `House 27` onwards.
#[must_use]
pub fn default_label(index: usize) -> String {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or_else(
            || format!("House {}", index + 1),
            |i| format!("House {}", char::from(b'A' + i)),
        )
}

/// Pairs addresses with labels, filling in defaults for missing labels.
///
/// # Errors
///
/// Returns an error if there are more labels than addresses or an address
/// is blank.
pub fn house_inputs(addresses: &[String], labels: &[String]) -> Result<Vec<HouseInput>, String> {
    if labels.len() > addresses.len() {
        return Err(format!(
            "{} labels given for {} addresses",
            labels.len(),
            addresses.len()
        ));
    }

    addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            let address = address.trim();
            if address.is_empty() {
                return Err(format!("Address #{} is empty", i + 1));
            }
            Ok(HouseInput {
                label: labels.get(i).cloned().unwrap_or_else(|| default_label(i)),
                title: address.to_string(),
                address: address.to_string(),
            })
        })
        .collect()
}

/// Runs one analysis and reports it.
///
/// Service credentials are checked before any request is sent. Narrative
/// failures are reported but do not fail the run.
///
/// # Errors
///
/// Returns an error for missing credentials, invalid input or a failed
/// CSV export.
#[allow(clippy::future_not_send)]
pub async fn execute(
    multi: &MultiProgress,
    request: AnalysisRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let geocoder = GoogleGeocoder::from_env()?;
    let search = GooglePlacesClient::from_env()?;
    let narrator = if request.narrate {
        Some(Narrator::new(create_provider_from_env()?))
    } else {
        None
    };

    let throttle = search.throttle();
    let context = AnalysisContext::new(&geocoder, &search, request.selection, request.radius_m)
        .with_extra_keyword(request.extra_keyword)
        .with_throttle(throttle)
        .with_progress(Box::new(|label: &str| IndicatifProgress::house_bar(multi, label)));

    let result = context.run(&request.houses).await?;

    println!();
    print!("{}", report::render(&result));

    if result.houses.is_empty() {
        log::warn!("No address could be located; skipping export and narrative");
        return Ok(());
    }

    if let Some(path) = &request.export {
        export_facilities_csv(path, &result.table)?;
        println!("Exported {} rows to {}", result.table.len(), path.display());
    }

    if let Some(narrator) = narrator {
        match narrator
            .narrate_result(&result, None, request.profile.as_ref())
            .await
        {
            Ok(Narration::Generated(text)) => {
                println!();
                println!("{text}");
            }
            Ok(Narration::CoolingDown { remaining }) => {
                println!(
                    "Narrative skipped: try again in {}s",
                    remaining.as_secs() + 1
                );
            }
            Err(e) => log::error!("Narrative generation failed: {e}"),
        }
    }

    Ok(())
}
