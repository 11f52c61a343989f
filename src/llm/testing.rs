// src/llm/testing.rs
// Test doubles for the inference boundary (unit tests only)

use super::{ChatRequest, ChatResult, LlmClient, Usage};
use crate::error::{PlantitasError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

type ReplyFn = Box<dyn Fn() -> Result<ChatResult> + Send + Sync>;

/// Client that answers every request the same way and records what it saw
pub(crate) struct ScriptedClient {
    reply: ReplyFn,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    /// Reply with `content`; `total_tokens: None` omits the usage block
    pub fn content(content: &str, total_tokens: Option<u32>) -> Self {
        let content = content.to_string();
        Self::with_reply(Box::new(move || {
            Ok(ChatResult {
                request_id: "req-test".into(),
                content: Some(content.clone()),
                usage: total_tokens.map(|t| Usage {
                    prompt_tokens: t / 2,
                    completion_tokens: t - t / 2,
                    total_tokens: t,
                }),
                duration_ms: 1,
            })
        }))
    }

    /// Reply with no content at all
    pub fn empty() -> Self {
        Self::with_reply(Box::new(|| {
            Ok(ChatResult {
                request_id: "req-test".into(),
                content: None,
                usage: None,
                duration_ms: 1,
            })
        }))
    }

    pub fn failing(make: fn() -> PlantitasError) -> Self {
        Self::with_reply(Box::new(move || Err(make())))
    }

    fn with_reply(reply: ReplyFn) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_request(&self) -> ChatRequest {
        self.requests().pop().expect("no request recorded")
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResult> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }
        (self.reply)()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A network-level failure without touching the network
pub(crate) fn transport_error() -> PlantitasError {
    PlantitasError::Api {
        status: 503,
        body: "upstream unavailable".into(),
    }
}
