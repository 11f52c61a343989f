// src/llm/openai_compat/response.rs
// OpenAI-compatible chat response parsing

use crate::error::Result;
use crate::llm::{ChatResult, Usage};
use serde::Deserialize;
use tracing::warn;

/// Non-streaming chat response (OpenAI-compatible format)
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseChoice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Parse an OpenAI-compatible chat response into a ChatResult.
/// A missing first choice or null content yields `content: None`; the
/// caller decides whether that is an error.
pub fn parse_chat_response(
    response_body: &str,
    request_id: &str,
    duration_ms: u64,
) -> Result<ChatResult> {
    let data: ChatResponse = serde_json::from_str(response_body)?;

    let choice = data.choices.into_iter().next();
    if choice.as_ref().and_then(|c| c.finish_reason.as_deref()) == Some("length") {
        // JSON-mode replies cut at max_tokens will not parse
        warn!(request_id = %request_id, "Reply truncated at max_tokens");
    }
    let content = choice
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty());

    Ok(ChatResult {
        request_id: request_id.to_owned(),
        content,
        usage: data.usage,
        duration_ms,
    })
}
