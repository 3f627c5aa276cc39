//! Interactive analysis setup.
//!
//! Walks the user through picking a buyer profile (or categories by hand),
//! entering addresses, the radius and the output options, then runs the
//! same analysis as `house_map analyze`.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, MultiSelect, Select};
use house_map_amenity_models::{Category, Selection, Taxonomy};
use house_map_cli_utils::MultiProgress;
use house_map_profiles::{BuyerProfile, all_profiles, expand};

use crate::analyze::{
    self, AnalysisRequest, DEFAULT_RADIUS_M, default_label, house_inputs, parse_radius,
};

/// How the category selection is chosen.
enum SelectionMode {
    Profile,
    Manual,
}

impl SelectionMode {
    const ALL: &[Self] = &[Self::Profile, Self::Manual];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Profile => "Start from a buyer profile",
            Self::Manual => "Choose categories manually",
        }
    }
}

fn category_label(category: Category) -> String {
    format!("{category} ({})", category.english_name())
}

fn pick_profile() -> Result<BuyerProfile, Box<dyn std::error::Error>> {
    let profiles = all_profiles();
    let labels: Vec<String> = profiles
        .iter()
        .map(|p| format!("{} {} ({} m): {}", p.icon, p.name, p.radius_m, p.description))
        .collect();

    let idx = Select::new()
        .with_prompt("Buyer profile")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(profiles[idx].clone())
}

fn pick_categories() -> Result<Selection, Box<dyn std::error::Error>> {
    let labels: Vec<String> = Category::ALL.iter().map(|c| category_label(*c)).collect();

    let chosen = MultiSelect::new()
        .with_prompt("Categories (space=toggle, enter=confirm)")
        .items(&labels)
        .interact()?;

    let mut selection = Selection::new();
    for idx in chosen {
        let category = Category::ALL[idx];
        let subtypes: Vec<&str> = Taxonomy::subtypes(category).collect();
        let defaults = vec![true; subtypes.len()];

        let picked = MultiSelect::new()
            .with_prompt(format!("{} subtypes", category_label(category)))
            .items(&subtypes)
            .defaults(&defaults)
            .interact()?;

        selection.add(category, picked.into_iter().map(|i| subtypes[i]));
    }

    Ok(selection)
}

fn prompt_addresses() -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut addresses = Vec::new();
    loop {
        let prompt = if addresses.is_empty() {
            format!("Address for {}", default_label(0))
        } else {
            format!(
                "Address for {} (empty to finish)",
                default_label(addresses.len())
            )
        };

        let address: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;

        let address = address.trim();
        if address.is_empty() {
            if addresses.is_empty() {
                println!("At least one address is required.");
                continue;
            }
            return Ok(addresses);
        }
        addresses.push(address.to_string());
    }
}

/// Prompts the user for an optional string.
///
/// Returns `None` if the input is empty.
fn prompt_optional(prompt: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}

/// Runs the interactive flow.
///
/// # Errors
///
/// Returns an error if a prompt fails or the analysis cannot start.
#[allow(clippy::future_not_send)]
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let mode_labels: Vec<&str> = SelectionMode::ALL
        .iter()
        .map(SelectionMode::label)
        .collect();

    let mode = Select::new()
        .with_prompt("How should amenities be chosen?")
        .items(&mode_labels)
        .default(0)
        .interact()?;

    let (profile, selection) = match SelectionMode::ALL[mode] {
        SelectionMode::Profile => {
            let profile = pick_profile()?;
            let selection = expand(&profile).selection;
            (Some(profile), selection)
        }
        SelectionMode::Manual => (None, pick_categories()?),
    };

    if selection.is_empty() {
        println!("Nothing selected.");
        return Ok(());
    }

    let addresses = prompt_addresses()?;

    let radius_str: String = Input::new()
        .with_prompt("Search radius (meters)")
        .default(
            profile
                .as_ref()
                .map_or(DEFAULT_RADIUS_M, |p| p.radius_m)
                .to_string(),
        )
        .interact_text()?;
    let radius_m = parse_radius(&radius_str)?;

    let extra_keyword = prompt_optional("Extra keyword (empty for none)")?;

    let export = if Confirm::new()
        .with_prompt("Export facilities to CSV?")
        .default(false)
        .interact()?
    {
        let path: String = Input::new()
            .with_prompt("CSV path")
            .default("facilities.csv".to_string())
            .interact_text()?;
        Some(PathBuf::from(path))
    } else {
        None
    };

    let narrate = Confirm::new()
        .with_prompt("Generate an AI narrative?")
        .default(false)
        .interact()?;

    let request = AnalysisRequest {
        houses: house_inputs(&addresses, &[])?,
        selection,
        radius_m,
        extra_keyword,
        profile,
        export,
        narrate,
    };

    analyze::execute(multi, request).await
}
