// src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Values shipped in sample `.env` files that must never reach the API
const PLACEHOLDER_KEYS: &[&str] = &[
    "your-openai-api-key",
    "your_openai_api_key",
    "sk-your-key-here",
    "sk-...",
    "changeme",
];

/// True when an API key is empty or an obvious placeholder
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() {
        return true;
    }
    let lower = key.to_lowercase();
    PLACEHOLDER_KEYS.contains(&lower.as_str())
        || lower.contains("placeholder")
        || lower.starts_with("your-")
}

/// Configuration validation result
#[derive(Debug)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for ConfigValidation {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Environment configuration - all env vars in one place
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// OpenAI API key (OPENAI_API_KEY)
    pub openai_api_key: Option<String>,
    /// Chat completions base URL (PLANTITAS_OPENAI_BASE_URL)
    pub base_url: String,
    /// Model used by the image agents (PLANTITAS_VISION_MODEL)
    pub vision_model: String,
    /// Cheaper model used by text-only agents and chat (PLANTITAS_TEXT_MODEL)
    pub text_model: String,
    /// Per-request timeout (PLANTITAS_REQUEST_TIMEOUT_SECS)
    pub request_timeout: Duration,
    /// Connect timeout (PLANTITAS_CONNECT_TIMEOUT_SECS)
    pub connect_timeout: Duration,
    /// Extra attempts on transient failures (PLANTITAS_MAX_RETRIES, default 0)
    pub max_retries: u32,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

impl EnvConfig {
    /// Load all environment configuration (call once at startup)
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        info!("Loading environment configuration");
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            openai_api_key: read("OPENAI_API_KEY"),
            base_url: read("PLANTITAS_OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            vision_model: read("PLANTITAS_VISION_MODEL").unwrap_or(defaults.vision_model),
            text_model: read("PLANTITAS_TEXT_MODEL").unwrap_or(defaults.text_model),
            request_timeout: parse_secs(read("PLANTITAS_REQUEST_TIMEOUT_SECS"))
                .unwrap_or(defaults.request_timeout),
            connect_timeout: parse_secs(read("PLANTITAS_CONNECT_TIMEOUT_SECS"))
                .unwrap_or(defaults.connect_timeout),
            max_retries: read("PLANTITAS_MAX_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_retries),
        };

        if config.has_usable_key() {
            debug!(
                vision_model = %config.vision_model,
                text_model = %config.text_model,
                max_retries = config.max_retries,
                "OpenAI credentials loaded"
            );
        } else {
            warn!("No usable OPENAI_API_KEY - analysis requests will fail fast");
        }
        config
    }

    /// Whether the configured key could plausibly authenticate
    pub fn has_usable_key(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|k| !is_placeholder_key(k))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        match self.openai_api_key.as_deref() {
            None => validation.add_error("OPENAI_API_KEY is not set."),
            Some(k) if is_placeholder_key(k) => {
                validation.add_error("OPENAI_API_KEY still holds a placeholder value.")
            }
            Some(_) => {}
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            validation.add_error(format!(
                "PLANTITAS_OPENAI_BASE_URL '{}' is not an http(s) URL",
                self.base_url
            ));
        }

        if self.max_retries > 5 {
            validation.add_warning(format!(
                "PLANTITAS_MAX_RETRIES={} multiplies token spend on outages",
                self.max_retries
            ));
        }

        if self.request_timeout < Duration::from_secs(5) {
            validation.add_warning("Request timeout under 5s will cut off vision calls.");
        }

        validation
    }
}

fn parse_secs(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
