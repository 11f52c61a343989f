// src/error.rs
// Standardized error types for Plantitas

use thiserror::Error;

/// Main error type for the Plantitas library
#[derive(Error, Debug)]
pub enum PlantitasError {
    /// Inference credential missing or still a placeholder. Raised before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("empty content in inference response")]
    EmptyContent,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),
}

/// Convenience type alias for Result using PlantitasError
pub type Result<T> = std::result::Result<T, PlantitasError>;

impl PlantitasError {
    /// Short category label used in agent reasoning and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Http(_) | Self::Api { .. } => "transport",
            Self::EmptyContent | Self::Json(_) => "content",
            Self::Llm(_) => "llm",
            Self::Pipeline(_) => "pipeline",
        }
    }
}

impl From<String> for PlantitasError {
    fn from(s: String) -> Self {
        PlantitasError::Llm(s)
    }
}
