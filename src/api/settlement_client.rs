use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SettlementConfig, SettlementMode};
use crate::error::{Error, Result};
use crate::interfaces::settlement_gateway::{DealConfirmation, SettlementGateway};
use crate::types::ids::DealId;

/// Why one HTTP attempt failed, and whether another attempt may help.
#[derive(Debug)]
struct AttemptFailure {
    message: String,
    retryable: bool,
}

impl AttemptFailure {
    fn from_status(status: StatusCode) -> Self {
        let message = match status.as_u16() {
            400 => "Bad request. Please check your input.".to_string(),
            401 => "Authentication required. Please log in.".to_string(),
            403 => "Access denied. You do not have permission.".to_string(),
            404 => "Resource not found.".to_string(),
            429 => "Too many requests. Please try again later.".to_string(),
            500 => "Server error. Please try again later.".to_string(),
            _ => status.canonical_reason().unwrap_or("Unknown error").to_string(),
        };
        AttemptFailure {
            message: format!("HTTP {}: {message}", status.as_u16()),
            retryable: !status.is_client_error(),
        }
    }

    fn from_transport(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "Request timed out. Please try again.".to_string()
        } else if error.is_connect() || error.is_request() {
            "Network connection failed. Please check your internet connection.".to_string()
        } else {
            format!("An unexpected error occurred: {error}")
        };
        AttemptFailure {
            message,
            retryable: true,
        }
    }
}

/// The backend may answer with an empty body or a deal record; only a
/// confirmation body carries the acceptance time. A confirmation naming a
/// different deal is not an acceptance of this one.
fn accepted_from_body(deal_id: &DealId, body: &[u8]) -> std::result::Result<DealConfirmation, AttemptFailure> {
    match serde_json::from_slice::<DealConfirmation>(body) {
        Ok(confirmation) if &confirmation.deal_id == deal_id => Ok(confirmation),
        Ok(confirmation) => Err(AttemptFailure {
            message: format!("Confirmation was issued for deal {}", confirmation.deal_id),
            retryable: false,
        }),
        Err(_) => Ok(DealConfirmation::accepted_now(deal_id.clone())),
    }
}

/// Confirms deals against the backend with `PUT {base}/api/deals/{id}/confirm`.
///
/// Each attempt has its own timeout. Server errors, timeouts and network
/// failures are retried up to `retries` times with exponential backoff
/// (`1s · 2^attempt`, capped at `max_backoff_ms`). Client errors (4xx) are
/// final. Every failure surfaces as [`Error::SettlementRejected`].
pub struct HttpSettlementGateway {
    client: Client,
    base_url: String,
    retries: u32,
    max_backoff: Duration,
}

impl HttpSettlementGateway {
    pub fn new(config: &SettlementConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpSettlementGateway {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        })
    }

    fn endpoint(&self, deal_id: &DealId) -> String {
        format!("{}/api/deals/{}/confirm", self.base_url, deal_id)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponential = Duration::from_millis(1000u64.saturating_mul(1u64 << attempt.min(20)));
        exponential.min(self.max_backoff)
    }

    async fn attempt(&self, deal_id: &DealId) -> std::result::Result<DealConfirmation, AttemptFailure> {
        let response = self
            .client
            .put(self.endpoint(deal_id))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(AttemptFailure::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure::from_status(status));
        }

        let body = response.bytes().await.map_err(AttemptFailure::from_transport)?;
        accepted_from_body(deal_id, &body)
    }
}

#[async_trait]
impl SettlementGateway for HttpSettlementGateway {
    async fn confirm_deal(&self, deal_id: &DealId) -> Result<DealConfirmation> {
        let mut attempt = 0;
        loop {
            match self.attempt(deal_id).await {
                Ok(confirmation) => return Ok(confirmation),
                Err(failure) if failure.retryable && attempt < self.retries => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        deal_id = %deal_id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        reason = %failure.message,
                        "confirmation attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(Error::rejected(deal_id, failure.message)),
            }
        }
    }
}

/// Accepts every confirmation without a backend, as the offline client does.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalSettlementGateway;

#[async_trait]
impl SettlementGateway for LocalSettlementGateway {
    async fn confirm_deal(&self, deal_id: &DealId) -> Result<DealConfirmation> {
        Ok(DealConfirmation::accepted_now(deal_id.clone()))
    }
}

pub fn build_gateway(config: &SettlementConfig) -> Result<Arc<dyn SettlementGateway>> {
    Ok(match config.mode {
        SettlementMode::Http => Arc::new(HttpSettlementGateway::new(config)?),
        SettlementMode::Local => Arc::new(LocalSettlementGateway),
    })
}
