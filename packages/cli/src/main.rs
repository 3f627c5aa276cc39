#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Amenity analysis for house hunting.
//!
//! ```text
//! house_map analyze <ADDRESS>... [--label L]... [--profile ID] [--radius M]
//!                   [--category C]... [--extra-keyword K] [--export PATH] [--narrate]
//! house_map profiles
//! house_map taxonomy
//! ```
//!
//! Running `house_map` with no subcommand enters interactive mode.
//!
//! Uses `indicatif-log-bridge` (via [`house_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod analyze;
mod interactive;
mod report;

use clap::{Parser, Subcommand};
use house_map_amenity_models::{Category, Taxonomy};

#[derive(Parser)]
#[command(
    name = "house_map",
    about = "Find, count and compare amenities around house addresses"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze amenities around one or more addresses
    Analyze(analyze::AnalyzeArgs),
    /// List buyer profiles
    Profiles,
    /// Print the amenity taxonomy
    Taxonomy,
}

fn print_profiles() {
    for profile in house_map_profiles::profiles().values() {
        println!(
            "{} {} [{}] {} m",
            profile.icon, profile.name, profile.id, profile.radius_m
        );
        println!("  {}", profile.description);
        for focus in &profile.focus {
            println!("  - {focus}");
        }
        println!();
    }
}

fn print_taxonomy() {
    for &category in Category::ALL {
        println!(
            "{category} ({}) {}",
            category.english_name(),
            category.color()
        );
        for entry in Taxonomy::entries(category) {
            println!("  {:<8} {}", entry.subtype, entry.keyword);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = house_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("House Map");
        println!();
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Analyze(args) => analyze::execute(&multi, args.into_request()?).await?,
        Commands::Profiles => print_profiles(),
        Commands::Taxonomy => print_taxonomy(),
    }

    Ok(())
}
