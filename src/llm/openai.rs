// src/llm/openai.rs
// OpenAI chat completions client (vision + JSON mode)

use crate::config::{EnvConfig, is_placeholder_key};
use crate::error::{PlantitasError, Result};
use crate::llm::http_client::{LlmHttpClient, RetryPolicy};
use crate::llm::openai_compat::{ChatRequest, parse_chat_response};
use crate::llm::provider::LlmClient;
use crate::llm::{ChatResult, logging};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{Span, debug, instrument};
use uuid::Uuid;

const PROVIDER: &str = "OpenAI";

/// OpenAI API client
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: LlmHttpClient,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, http: LlmHttpClient) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Build a client from environment configuration. A missing key is kept
    /// as empty so every call fails fast with a configuration error.
    pub fn from_config(config: &EnvConfig) -> Self {
        let http = LlmHttpClient::new(config.request_timeout, config.connect_timeout)
            .with_retry(RetryPolicy::bounded(config.max_retries));
        Self::new(
            config.openai_api_key.clone().unwrap_or_default(),
            config.base_url.clone(),
            http,
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[instrument(skip(self, request), fields(request_id, model = %request.model, message_count = request.messages.len()))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatResult> {
        if is_placeholder_key(&self.api_key) {
            return Err(PlantitasError::Config(
                "OPENAI_API_KEY is missing or a placeholder".into(),
            ));
        }

        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());
        let start = Instant::now();

        let body = serde_json::to_string(&request)?;
        debug!(request_id = %request_id, body_len = body.len(), "Sending chat completion");

        let response_body = self
            .http
            .post_json(&request_id, &self.completions_url(), &self.api_key, body)
            .await?;

        let duration_ms = elapsed_ms(start.elapsed());
        let result = parse_chat_response(&response_body, &request_id, duration_ms)?;

        logging::log_call(PROVIDER, &request, &result);

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn elapsed_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
