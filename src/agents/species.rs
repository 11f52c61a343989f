// src/agents/species.rs
// Species identification from a single photo

use super::{
    AgentReport, AgentResponse, AgentSettings, invoke_json, lenient_bool, lenient_list,
    lenient_number,
};
use crate::llm::{ImageDetail, LlmClient, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "Eres un botánico experto en identificación de plantas de interior y jardín. \
Respondes únicamente con un objeto JSON válido.";

const USER_PROMPT: &str = r#"Identifica la especie de la planta de la foto. Devuelve exactamente este JSON:
{
  "species": "nombre científico",
  "commonName": "nombre común en español",
  "family": "familia botánica",
  "confidence": 0-100,
  "reasoning": "una frase explicando la identificación",
  "distinguishingFeatures": ["rasgo 1", "rasgo 2"],
  "isIndoor": true,
  "rareness": "común | poco común | rara"
}
Si no puedes identificarla, usa "Especie no identificada" y una confianza baja."#;

/// Species agent reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeciesIdentification {
    pub species: String,
    pub common_name: String,
    pub family: String,
    #[serde(deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
    pub reasoning: String,
    #[serde(deserialize_with = "lenient_list")]
    pub distinguishing_features: Vec<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_indoor: Option<bool>,
    pub rareness: String,
}

impl SpeciesIdentification {
    /// One-line description for downstream prompts
    pub fn describe(&self) -> String {
        match (self.species.trim(), self.common_name.trim()) {
            ("", "") => "especie desconocida".to_string(),
            (species, "") => species.to_string(),
            ("", common) => common.to_string(),
            (species, common) => format!("{} ({})", species, common),
        }
    }
}

impl AgentReport for SpeciesIdentification {
    const FALLBACK_CONFIDENCE: u8 = 50;

    fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    fn reasoning(&self) -> Option<&str> {
        Some(self.reasoning.as_str())
    }
}

/// Cheap, near-deterministic vision call with a small token budget
pub struct SpeciesIdentificationAgent {
    client: Arc<dyn LlmClient>,
    settings: AgentSettings,
}

impl SpeciesIdentificationAgent {
    pub const NAME: &'static str = "species_identification";

    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self::with_settings(client, Self::default_settings(model))
    }

    pub fn with_settings(client: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self { client, settings }
    }

    pub fn default_settings(model: impl Into<String>) -> AgentSettings {
        AgentSettings {
            model: model.into(),
            temperature: 0.1,
            max_tokens: 300,
            image_detail: Some(ImageDetail::Low),
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub async fn analyze(&self, image_url: &str) -> AgentResponse<SpeciesIdentification> {
        if image_url.trim().is_empty() {
            return AgentResponse::failed(format!("Error en {}: URL de imagen vacía", Self::NAME));
        }

        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user_with_image(
                USER_PROMPT,
                image_url,
                self.settings.image_detail.unwrap_or(ImageDetail::Low),
            ),
        ];
        invoke_json(Self::NAME, self.client.as_ref(), &self.settings, messages).await
    }
}
