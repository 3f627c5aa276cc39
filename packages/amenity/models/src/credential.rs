//! API key handling shared by the geocoding and place search clients.
//!
//! Keys are validated once, up front, so a missing or mangled key is
//! reported before any request is sent.

use thiserror::Error;

/// Environment variable holding the Google Maps Platform key.
pub const MAPS_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Errors from loading or validating a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The environment variable is unset.
    #[error("{var} environment variable not set")]
    Missing {
        /// Name of the variable that was read.
        var: String,
    },

    /// The key is empty or contains characters no API key can contain.
    #[error("Malformed API key: {reason}")]
    Malformed {
        /// What was wrong with it.
        reason: String,
    },
}

/// A validated API key. The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validates and wraps a raw key. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Malformed`] if the key is empty or has
    /// inner whitespace or non-printable characters.
    pub fn new(raw: &str) -> Result<Self, CredentialError> {
        let key = raw.trim();

        if key.is_empty() {
            return Err(CredentialError::Malformed {
                reason: "key is empty".to_string(),
            });
        }

        if let Some(c) = key.chars().find(|c| !c.is_ascii_graphic()) {
            return Err(CredentialError::Malformed {
                reason: format!("key contains invalid character {c:?}"),
            });
        }

        Ok(Self(key.to_string()))
    }

    /// Reads and validates a key from the environment variable `var`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Missing`] if the variable is unset, or
    /// [`CredentialError::Malformed`] if its value is not a usable key.
    pub fn from_env(var: &str) -> Result<Self, CredentialError> {
        let raw = std::env::var(var).map_err(|_| CredentialError::Missing {
            var: var.to_string(),
        })?;
        Self::new(&raw)
    }

    /// The raw key, for placing in a request.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}
