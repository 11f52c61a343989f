// src/llm/openai_compat/mod.rs
// Shared OpenAI-compatible request/response handling

mod request;
mod response;

pub use request::{ChatRequest, ResponseFormat};
pub use response::{ChatResponse, ResponseChoice, parse_chat_response};
