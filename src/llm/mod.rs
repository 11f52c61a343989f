// src/llm/mod.rs
// Inference boundary: OpenAI-compatible client, wire types, HTTP plumbing

pub mod http_client;
pub mod logging;
mod openai;
pub mod openai_compat;
mod provider;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use http_client::{LlmHttpClient, RetryPolicy};
pub use openai::OpenAiClient;
pub use openai_compat::{ChatRequest, ResponseFormat};
pub use provider::LlmClient;
pub use types::{ChatResult, ContentPart, ImageDetail, ImageUrl, Message, MessageContent, Usage};
