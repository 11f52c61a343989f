// src/agents/personality.rs
// Plant persona generation

use super::{
    AgentReport, AgentResponse, AgentSettings, HealthDiagnosis, SpeciesIdentification,
    invoke_json, lenient_list, lenient_number,
};
use crate::llm::{LlmClient, Message};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "Eres un guionista creativo que da personalidad a las plantas \
para que sus dueños conversen con ellas. Respondes únicamente con un objeto JSON válido.";

const RESPONSE_SHAPE: &str = r#"Devuelve exactamente este JSON:
{
  "energyLevel": "alta | media | baja",
  "communicationStyle": "amigable | sabio | jugueton | dramatico | timido",
  "interests": ["interés"],
  "quirks": ["manía simpática"],
  "mood": "estado de ánimo actual en una o dos palabras",
  "catchphrases": ["frase típica 1", "frase típica 2"],
  "confidence": 0-100,
  "reasoning": "por qué esta personalidad encaja"
}"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum EnergyLevel {
    Alta,
    #[default]
    Media,
    Baja,
}

impl From<Option<String>> for EnergyLevel {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(|v| v.trim().to_lowercase()).as_deref() {
            Some("alta" | "alto" | "high") => Self::Alta,
            Some("baja" | "bajo" | "low") => Self::Baja,
            _ => Self::Media,
        }
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Alta => "alta",
            Self::Media => "media",
            Self::Baja => "baja",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum CommunicationStyle {
    #[default]
    Amigable,
    Sabio,
    Jugueton,
    Dramatico,
    Timido,
}

impl From<Option<String>> for CommunicationStyle {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(|v| v.trim().to_lowercase()).as_deref() {
            Some("sabio" | "sabia" | "wise") => Self::Sabio,
            Some("jugueton" | "juguetón" | "juguetona" | "playful") => Self::Jugueton,
            Some("dramatico" | "dramático" | "dramatica" | "dramática" | "dramatic") => {
                Self::Dramatico
            }
            Some("timido" | "tímido" | "timida" | "tímida" | "shy") => Self::Timido,
            _ => Self::Amigable,
        }
    }
}

impl CommunicationStyle {
    /// How the persona should sound, for the chat system prompt
    pub fn voice(&self) -> &'static str {
        match self {
            Self::Amigable => "cálida, cercana y animada",
            Self::Sabio => "pausada, reflexiva y con pequeñas lecciones de vida",
            Self::Jugueton => "traviesa, con bromas y juegos de palabras",
            Self::Dramatico => "exagerada y teatral, como en una telenovela",
            Self::Timido => "breve, tímida y un poco insegura",
        }
    }
}

impl fmt::Display for CommunicationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Amigable => "amigable",
            Self::Sabio => "sabio",
            Self::Jugueton => "jugueton",
            Self::Dramatico => "dramatico",
            Self::Timido => "timido",
        })
    }
}

/// Personality agent reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlantPersonality {
    pub energy_level: EnergyLevel,
    pub communication_style: CommunicationStyle,
    #[serde(deserialize_with = "lenient_list")]
    pub interests: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub quirks: Vec<String>,
    pub mood: String,
    #[serde(deserialize_with = "lenient_list")]
    pub catchphrases: Vec<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
    pub reasoning: String,
}

impl AgentReport for PlantPersonality {
    const FALLBACK_CONFIDENCE: u8 = 85;

    fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    fn reasoning(&self) -> Option<&str> {
        Some(self.reasoning.as_str())
    }
}

/// Text-only agent with the highest temperature; personalities should vary
pub struct PersonalityAgent {
    client: Arc<dyn LlmClient>,
    settings: AgentSettings,
}

impl PersonalityAgent {
    pub const NAME: &'static str = "personality";

    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self::with_settings(client, Self::default_settings(model))
    }

    pub fn with_settings(client: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self { client, settings }
    }

    pub fn default_settings(model: impl Into<String>) -> AgentSettings {
        AgentSettings {
            model: model.into(),
            temperature: 0.9,
            max_tokens: 400,
            image_detail: None,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub async fn analyze(
        &self,
        species: &AgentResponse<SpeciesIdentification>,
        health: &AgentResponse<HealthDiagnosis>,
    ) -> AgentResponse<PlantPersonality> {
        let species_line = species
            .report()
            .map(|s| s.describe())
            .unwrap_or_else(|| "una planta de especie desconocida".into());
        let health_line = health
            .report()
            .map(|h| h.describe())
            .unwrap_or_else(|| "salud desconocida".into());

        let prompt = format!(
            "Inventa la personalidad de esta planta. Su estado de salud debe influir en su ánimo.\n\
             Planta: {}\nSalud: {}\n\n{}",
            species_line, health_line, RESPONSE_SHAPE
        );
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        invoke_json(Self::NAME, self.client.as_ref(), &self.settings, messages).await
    }
}
