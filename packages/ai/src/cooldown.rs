//! Rate limiting for narrative generation.
//!
//! A [`CooldownGate`] enforces a minimum interval between generative-model
//! calls. A call inside the window is not an error: [`Narrator`] returns
//! [`Narration::CoolingDown`] and logs a warning without touching the
//! provider. The window starts when a call is attempted, so a failed call
//! also counts.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use house_map_analysis_models::AnalysisResult;
use house_map_profiles::BuyerProfile;
use tokio::time::Instant;

use crate::AiError;
use crate::narrative::{build_comparison_prompt, build_single_prompt, system_prompt};
use crate::providers::LlmProvider;

/// Minimum time between two generations.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Minimum-interval gate.
pub struct CooldownGate {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl CooldownGate {
    /// Creates a gate that opens `window` after each acquisition.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Time left before the gate opens, or `None` if it is open.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let last = *self.last.lock().unwrap_or_else(PoisonError::into_inner);
        last.and_then(|at| self.window.checked_sub(at.elapsed()))
            .filter(|left| !left.is_zero())
    }

    /// Passes the gate and restarts the window.
    ///
    /// # Errors
    ///
    /// Returns the time left if the window has not elapsed yet; the window
    /// is not restarted in that case.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        if let Some(at) = *last
            && let Some(left) = self.window.checked_sub(now.duration_since(at))
            && !left.is_zero()
        {
            return Err(left);
        }
        *last = Some(now);
        Ok(())
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

/// Outcome of a narration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narration {
    /// Text produced by the model.
    Generated(String),
    /// The cooldown window is still open; nothing was sent.
    CoolingDown {
        /// Time until the next generation is allowed.
        remaining: Duration,
    },
}

/// Generates narratives through an [`LlmProvider`] behind a [`CooldownGate`].
pub struct Narrator {
    provider: Box<dyn LlmProvider>,
    gate: CooldownGate,
}

impl Narrator {
    /// Creates a narrator with the [`DEFAULT_COOLDOWN`].
    #[must_use]
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            gate: CooldownGate::default(),
        }
    }

    /// Replaces the cooldown window.
    #[must_use]
    pub fn with_cooldown(mut self, window: Duration) -> Self {
        self.gate = CooldownGate::new(window);
        self
    }

    /// Sends `prompt` unless the cooldown window is open.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the provider call fails.
    pub async fn narrate(&self, prompt: &str) -> Result<Narration, AiError> {
        if let Err(remaining) = self.gate.try_acquire() {
            log::warn!(
                "Narrative generation cooling down; try again in {}s",
                remaining.as_secs() + 1
            );
            return Ok(Narration::CoolingDown { remaining });
        }

        log::info!("Generating narrative with {}", self.provider.name());
        let text = self.provider.complete(&system_prompt(), prompt).await?;
        Ok(Narration::Generated(text))
    }

    /// Narrates `result`: the house named by `label`, or a comparison of
    /// all houses when `label` is `None` and more than one was analyzed.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::UnknownHouse`] for a label not in `result`,
    /// [`AiError::NoHouses`] if nothing was analyzed, or any provider error.
    pub async fn narrate_result(
        &self,
        result: &AnalysisResult,
        label: Option<&str>,
        profile: Option<&BuyerProfile>,
    ) -> Result<Narration, AiError> {
        let prompt = match label {
            Some(label) => build_single_prompt(result, label, profile).ok_or_else(|| {
                AiError::UnknownHouse {
                    label: label.to_string(),
                }
            })?,
            None if result.is_comparison() => {
                build_comparison_prompt(result, profile).ok_or(AiError::NoHouses)?
            }
            None => {
                let house = result.houses.first().ok_or(AiError::NoHouses)?;
                build_single_prompt(result, &house.label, profile).ok_or(AiError::NoHouses)?
            }
        };

        self.narrate(&prompt).await
    }
}
