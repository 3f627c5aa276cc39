#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! House amenity analysis.
//!
//! The [`pipeline`] geocodes each house, runs the facility query engine
//! around it and hands the place lists to the [`aggregate`] functions,
//! which derive counts, distance statistics, breakdowns, rankings and the
//! flat facilities table. [`export`] writes that table as Excel-friendly
//! CSV.

pub mod aggregate;
pub mod export;
pub mod pipeline;

use thiserror::Error;

pub use pipeline::AnalysisContext;

/// Errors that prevent an analysis run from starting.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No houses were given.
    #[error("No houses to analyze")]
    NoHouses,

    /// Two houses share a label.
    #[error("Duplicate house label: {label}")]
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },
}

/// Errors from writing the facilities table.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing to the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
