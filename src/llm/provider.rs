// src/llm/provider.rs
// Inference boundary: the one trait every agent talks to

use async_trait::async_trait;

use super::{ChatRequest, ChatResult};
use crate::error::Result;

/// Trait for LLM clients. Implementations own transport, auth and timeouts;
/// callers only see a parsed `ChatResult` or a typed error.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request
    async fn chat(&self, request: ChatRequest) -> Result<ChatResult>;

    /// Provider name for logging/debugging
    fn name(&self) -> &'static str;
}
