// src/llm/logging.rs
// Per-call inference telemetry

use super::{ChatRequest, ChatResult};
use tracing::{info, warn};

/// One line per completed inference call. Token fields are zero when the
/// provider omitted usage.
pub fn log_call(provider: &str, request: &ChatRequest, result: &ChatResult) {
    let usage = result.usage.clone().unwrap_or_default();
    let has_image = request.messages.iter().any(|m| m.content.image().is_some());
    info!(
        request_id = %result.request_id,
        model = %request.model,
        json_mode = request.response_format.is_some(),
        has_image,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        duration_ms = result.duration_ms,
        content_len = result.content.as_ref().map_or(0, |c| c.len()),
        "{} call complete", provider
    );
    if result.content.is_none() {
        warn!(request_id = %result.request_id, "{} returned no content", provider);
    }
}
