#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Narrative generation for amenity analyses.
//!
//! Turns an [`AnalysisResult`](house_map_analysis_models::AnalysisResult)
//! into a structured prompt and sends it to a generative model. Supports
//! Anthropic Claude, `OpenAI` (and any `OpenAI`-compatible server via
//! `AI_BASE_URL`) and Google Gemini. Repeat generations are rate limited by
//! a [`cooldown::CooldownGate`].

pub mod cooldown;
pub mod narrative;
pub mod providers;

use thiserror::Error;

pub use cooldown::{CooldownGate, Narration, Narrator};
pub use providers::{LlmProvider, create_provider_from_env};

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// The analysis has no houses to narrate.
    #[error("No analyzed houses to narrate")]
    NoHouses,

    /// The requested house is not part of the analysis.
    #[error("No analyzed house labelled {label}")]
    UnknownHouse {
        /// The label that was requested.
        label: String,
    },
}
