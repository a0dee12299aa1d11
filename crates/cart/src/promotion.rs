//! Promotion Application Service client.
//!
//! The service is the pricing authority: it validates a promotion code
//! against the current items and returns the full set of repriced items.
//! The cart never partially applies a code - any non-success response means
//! "code not applied" and leaves state untouched.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use backlot_core::CartItem;

use crate::config::PromotionApiConfig;

/// Errors from the promotion service boundary.
#[derive(Debug, Error)]
pub enum PromotionError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status and no usable body.
    #[error("Promotion service returned status {0}")]
    Status(u16),

    /// Service rejected the code (invalid, expired, not applicable).
    #[error("Promotion rejected: {0}")]
    Rejected(String),

    /// Response body failed to parse.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The external pricing authority that applies promotion codes.
pub trait PromotionService {
    /// Validate `code` against `items` and return the repriced item set.
    ///
    /// # Errors
    ///
    /// Any [`PromotionError`] means the code was not applied; the caller
    /// must not mutate cart state.
    fn apply(
        &self,
        code: &str,
        items: &[CartItem],
    ) -> impl Future<Output = Result<Vec<CartItem>, PromotionError>> + Send;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyRequest<'a> {
    code: &'a str,
    items: &'a [CartItem],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyResponse {
    repriced_items: Vec<CartItem>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the Promotion Application Service.
#[derive(Debug, Clone)]
pub struct HttpPromotionClient {
    http: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl HttpPromotionClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the HTTP client cannot
    /// be constructed.
    pub fn new(config: &PromotionApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
        })
    }
}

impl PromotionService for HttpPromotionClient {
    async fn apply(
        &self,
        code: &str,
        items: &[CartItem],
    ) -> Result<Vec<CartItem>, PromotionError> {
        let url = format!("{}/promotions/apply", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_token.expose_secret())
            .json(&ApplyRequest { code, items })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the service's own rejection message when it sent one
            if let Ok(rejection) = serde_json::from_str::<ErrorBody>(&body) {
                return Err(PromotionError::Rejected(rejection.error));
            }
            return Err(PromotionError::Status(status.as_u16()));
        }

        let parsed: ApplyResponse = serde_json::from_str(&body)?;
        Ok(parsed.repriced_items)
    }
}
