// src/agents/health.rs
// Health diagnosis from the photo, grounded on the identified species

use super::{
    AgentReport, AgentResponse, AgentSettings, SpeciesIdentification, invoke_json, lenient_list,
    lenient_number,
};
use crate::llm::{ImageDetail, LlmClient, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "Eres fitopatólogo especializado en plantas de interior. \
Examinas hojas, tallos y sustrato con detalle. Respondes únicamente con un objeto JSON válido.";

const USER_PROMPT: &str = r#"Diagnostica la salud de la planta de la foto. Devuelve exactamente este JSON:
{
  "overallHealth": "excellent | good | fair | poor | critical",
  "healthScore": 0-100,
  "symptoms": ["síntoma visible"],
  "diseases": ["enfermedad probable"],
  "pests": ["plaga detectada"],
  "nutritionalIssues": ["carencia"],
  "urgentActions": ["acción inmediata"],
  "prognosis": "pronóstico en una frase",
  "confidence": 0-100,
  "reasoning": "qué observaste para llegar al diagnóstico"
}
Usa listas vacías cuando no haya nada que reportar."#;

/// Overall health bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum HealthStatus {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Critical,
}

impl From<Option<String>> for HealthStatus {
    fn from(value: Option<String>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        match value.trim().to_lowercase().as_str() {
            "excellent" | "excelente" => Self::Excellent,
            "fair" | "regular" | "moderate" => Self::Fair,
            "poor" | "mala" | "malo" | "deficiente" => Self::Poor,
            "critical" | "crítica" | "critica" | "crítico" | "critico" => Self::Critical,
            _ => Self::Good,
        }
    }
}

impl HealthStatus {
    /// Bucket for a 0-100 score, used when the model gives only a number
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            70..=89 => Self::Good,
            50..=69 => Self::Fair,
            25..=49 => Self::Poor,
            _ => Self::Critical,
        }
    }
}

/// Health agent reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthDiagnosis {
    pub overall_health: Option<HealthStatus>,
    #[serde(deserialize_with = "lenient_number")]
    pub health_score: Option<f64>,
    #[serde(deserialize_with = "lenient_list")]
    pub symptoms: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub diseases: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub pests: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub nutritional_issues: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub urgent_actions: Vec<String>,
    pub prognosis: String,
    #[serde(deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
    pub reasoning: String,
}

impl HealthDiagnosis {
    /// Score clamped into 0-100, if the model gave one
    pub fn score(&self) -> Option<u8> {
        self.health_score
            .filter(|s| s.is_finite())
            .map(|s| s.round().clamp(0.0, 100.0) as u8)
    }

    /// Reported status, or one derived from the score
    pub fn status(&self) -> Option<HealthStatus> {
        self.overall_health
            .or_else(|| self.score().map(HealthStatus::from_score))
    }

    /// Compact summary for downstream prompts
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = self.status() {
            parts.push(format!("estado {:?}", status).to_lowercase());
        }
        if let Some(score) = self.score() {
            parts.push(format!("puntuación {}/100", score));
        }
        let problems: Vec<&str> = self
            .symptoms
            .iter()
            .chain(&self.diseases)
            .chain(&self.pests)
            .chain(&self.nutritional_issues)
            .map(String::as_str)
            .collect();
        if !problems.is_empty() {
            parts.push(format!("problemas: {}", problems.join(", ")));
        }
        if parts.is_empty() {
            "sin diagnóstico de salud".to_string()
        } else {
            parts.join("; ")
        }
    }
}

impl AgentReport for HealthDiagnosis {
    const FALLBACK_CONFIDENCE: u8 = 70;

    fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    fn reasoning(&self) -> Option<&str> {
        Some(self.reasoning.as_str())
    }
}

/// Vision call with a high detail hint and a larger token budget
pub struct HealthDiagnosisAgent {
    client: Arc<dyn LlmClient>,
    settings: AgentSettings,
}

impl HealthDiagnosisAgent {
    pub const NAME: &'static str = "health_diagnosis";

    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self::with_settings(client, Self::default_settings(model))
    }

    pub fn with_settings(client: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self { client, settings }
    }

    pub fn default_settings(model: impl Into<String>) -> AgentSettings {
        AgentSettings {
            model: model.into(),
            temperature: 0.2,
            max_tokens: 600,
            image_detail: Some(ImageDetail::High),
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Diagnose the photo. `species` is the identification report, if any.
    pub async fn analyze(
        &self,
        image_url: &str,
        species: Option<&SpeciesIdentification>,
    ) -> AgentResponse<HealthDiagnosis> {
        if image_url.trim().is_empty() {
            return AgentResponse::failed(format!("Error en {}: URL de imagen vacía", Self::NAME));
        }

        let species_line = match species {
            Some(s) => format!("La planta fue identificada como {}.", s.describe()),
            None => "La especie no pudo identificarse; diagnostica sin asumir especie.".to_string(),
        };
        let prompt = format!("{}\n\n{}", species_line, USER_PROMPT);

        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user_with_image(
                prompt,
                image_url,
                self.settings.image_detail.unwrap_or(ImageDetail::High),
            ),
        ];
        invoke_json(Self::NAME, self.client.as_ref(), &self.settings, messages).await
    }
}
