//! Promotion service client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKLOT_PROMO_API_URL` - Base URL of the Promotion Application Service
//! - `BACKLOT_PROMO_API_TOKEN` - Bearer token for the service
//!
//! ## Optional
//! - `BACKLOT_PROMO_TIMEOUT_SECS` - Request timeout in seconds (default: 10)

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Promotion Application Service client configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct PromotionApiConfig {
    /// Base URL of the promotion service (no trailing slash).
    pub base_url: String,
    /// Bearer token presented on every request.
    pub api_token: SecretString,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PromotionApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromotionApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PromotionApiConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// numeric variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = require_env("BACKLOT_PROMO_API_URL")?
            .trim_end_matches('/')
            .to_owned();
        let api_token = SecretString::from(require_env("BACKLOT_PROMO_API_TOKEN")?);
        let timeout_secs = match std::env::var("BACKLOT_PROMO_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar(
                    "BACKLOT_PROMO_TIMEOUT_SECS".to_owned(),
                    format!("not a number of seconds: {raw}"),
                )
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            api_token,
            timeout_secs,
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}
