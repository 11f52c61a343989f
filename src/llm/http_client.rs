// src/llm/http_client.rs
// Shared HTTP client configuration for the inference boundary

use crate::error::{PlantitasError, Result};
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Default base backoff duration between retries (doubles each attempt)
const DEFAULT_BASE_BACKOFF_MS: u64 = 500;
/// Upper bound for a single backoff sleep
const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;

/// Bounded retry with exponential backoff and full jitter.
///
/// `max_retries = 0` (the default) means exactly one attempt per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::bounded(0)
    }

    pub fn bounded(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
        }
    }

    /// Ceiling of the sleep before retry number `attempt` (0-based)
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Jittered sleep in `[0, backoff_ceiling(attempt)]`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt).as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=ceiling))
    }
}

/// HTTP client shared by all requests of one `OpenAiClient`
pub struct LlmHttpClient {
    client: Client,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl LlmHttpClient {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            request_timeout,
            connect_timeout,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// POST a JSON body with Bearer auth. Returns the response body on 2xx.
    pub async fn post_json(
        &self,
        request_id: &str,
        url: &str,
        api_key: &str,
        body: String,
    ) -> Result<String> {
        let mut attempt = 0;

        loop {
            let response_result = self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .body(body.clone())
                .send()
                .await;

            let retryable = attempt < self.retry.max_retries;

            match response_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text().await?);
                    }

                    let error_body = response.text().await.unwrap_or_default();
                    if retryable && (status.as_u16() == 429 || status.is_server_error()) {
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            request_id = %request_id,
                            status = %status,
                            attempt = attempt + 1,
                            "Transient API error, retrying in {:?}",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(PlantitasError::Api {
                        status: status.as_u16(),
                        body: error_body,
                    });
                }
                Err(e) => {
                    // Only connect/timeout failures are known not to have reached the model
                    if retryable && (e.is_connect() || e.is_timeout()) {
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            request_id = %request_id,
                            error = %e,
                            attempt = attempt + 1,
                            "Request failed (connect/timeout), retrying in {:?}",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(PlantitasError::Http(e));
                }
            }
        }
    }
}
