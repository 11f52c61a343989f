// src/agents/mod.rs
// Prompt-driven analysis agents and the envelope they all return

mod care;
mod context;
mod health;
mod personality;
mod species;

pub use care::{
    CareProfile, CareRecommendation, CareRecommendationAgent, FertilizingCare, HumidityCare,
    SunlightCare, TemperatureCare, WateringCare,
};
pub use context::{AnalysisContext, Season};
pub use health::{HealthDiagnosis, HealthDiagnosisAgent, HealthStatus};
pub use personality::{CommunicationStyle, EnergyLevel, PersonalityAgent, PlantPersonality};
pub use species::{SpeciesIdentification, SpeciesIdentificationAgent};

use crate::error::{PlantitasError, Result};
use crate::llm::{ChatRequest, ImageDetail, LlmClient, Message};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Model and sampling settings for one agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Detail hint for the attached photo; `None` for text-only agents
    pub image_detail: Option<ImageDetail>,
}

/// Result envelope of one agent invocation.
///
/// Failed invocations carry `data: None`, zero confidence and zero cost,
/// with `reasoning` holding the error summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub confidence: u8,
    pub reasoning: String,
    pub cost: u32,
}

impl<T> AgentResponse<T> {
    pub fn succeeded(data: T, confidence: u8, reasoning: impl Into<String>, cost: u32) -> Self {
        Self {
            success: true,
            data: Some(data),
            confidence: confidence.min(100),
            reasoning: reasoning.into(),
            cost,
        }
    }

    pub fn failed(reasoning: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            confidence: 0,
            reasoning: reasoning.into(),
            cost: 0,
        }
    }

    /// Report data only when the agent succeeded
    pub fn report(&self) -> Option<&T> {
        if self.success { self.data.as_ref() } else { None }
    }
}

/// A parsed agent reply that may carry its own confidence and reasoning
pub trait AgentReport: DeserializeOwned {
    /// Confidence used when the model omits one
    const FALLBACK_CONFIDENCE: u8;

    fn confidence(&self) -> Option<f64>;
    fn reasoning(&self) -> Option<&str>;
}

/// Run one JSON-mode inference call and fold every failure into the envelope
pub(crate) async fn invoke_json<T: AgentReport>(
    agent: &'static str,
    client: &dyn LlmClient,
    settings: &AgentSettings,
    messages: Vec<Message>,
) -> AgentResponse<T> {
    let request = ChatRequest::new(settings.model.clone(), messages)
        .with_max_tokens(settings.max_tokens)
        .with_temperature(settings.temperature)
        .json_object();

    match call_json::<T>(client, request, settings.max_tokens).await {
        Ok((report, cost)) => {
            let confidence = normalize_confidence(report.confidence(), T::FALLBACK_CONFIDENCE);
            let reasoning = report
                .reasoning()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or("Análisis completado")
                .to_string();
            debug!(agent, confidence, cost, "Agent succeeded");
            AgentResponse::succeeded(report, confidence, reasoning, cost)
        }
        Err(e) => {
            warn!(agent, kind = e.kind(), error = %e, "Agent failed");
            AgentResponse::failed(format!("Error en {}: {}", agent, e))
        }
    }
}

async fn call_json<T: DeserializeOwned>(
    client: &dyn LlmClient,
    request: ChatRequest,
    max_tokens: u32,
) -> Result<(T, u32)> {
    let result = client.chat(request).await?;
    let content = result.content.ok_or(PlantitasError::EmptyContent)?;

    let mut value: Value = serde_json::from_str(strip_code_fence(&content))?;
    if !value.is_object() {
        return Err(PlantitasError::Llm(
            "expected a JSON object in model reply".into(),
        ));
    }
    strip_nulls(&mut value);
    let report = serde_json::from_value(value)?;

    let cost = result
        .usage
        .map(|u| u.total_tokens)
        .filter(|t| *t > 0)
        .unwrap_or(max_tokens);
    Ok((report, cost))
}

/// Remove a ```json fence if the model wrapped its reply in one
pub(crate) fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Drop null-valued keys so serde falls back to the report defaults
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(strip_nulls);
        }
        _ => {}
    }
}

/// Clamp a model-reported confidence into 0-100. Values in (0, 1] are
/// fractions and get scaled, so 1.0 means full confidence.
pub(crate) fn normalize_confidence(raw: Option<f64>, fallback: u8) -> u8 {
    match raw {
        Some(v) if v.is_finite() => {
            let scaled = if v > 0.0 && v <= 1.0 { v * 100.0 } else { v };
            scaled.round().clamp(0.0, 100.0) as u8
        }
        _ => fallback.min(100),
    }
}

/// Accept numbers given as JSON numbers or numeric strings ("85", "85%")
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Accept a string map whose values may be strings, lists or numbers
pub(crate) fn lenient_text_map<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| text_from_value(&v).map(|t| (k, t)))
        .collect())
}

/// Accept a list of strings, a single string, or anything else (empty).
/// Non-string items are dropped.
pub(crate) fn lenient_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Accept booleans as JSON bools or yes/no words; anything else is `None`
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(bool_from_value))
}

fn bool_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "sí" | "si" | "interior" => Some(true),
            "false" | "no" | "exterior" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text_from_value).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}
