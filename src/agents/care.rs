// src/agents/care.rs
// Care plan from species + health, adjusted to the season

use super::{
    AgentReport, AgentResponse, AgentSettings, AnalysisContext, HealthDiagnosis, Season,
    SpeciesIdentification, invoke_json, lenient_list, lenient_number, lenient_text_map,
};
use crate::llm::{LlmClient, Message};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "Eres un experto en cuidado de plantas de interior que da consejos \
prácticos y concretos. Respondes únicamente con un objeto JSON válido.";

const RESPONSE_SHAPE: &str = r#"Devuelve exactamente este JSON:
{
  "careProfile": {
    "watering": {"frequency": "", "amount": "", "notes": ""},
    "sunlight": {"level": "", "hours": "", "notes": ""},
    "humidity": {"level": "", "notes": ""},
    "temperature": {"range": "", "notes": ""},
    "fertilizing": {"frequency": "", "type": "", "notes": ""}
  },
  "immediateActions": ["acción para hoy"],
  "weeklyRoutine": ["tarea semanal"],
  "seasonalTips": ["consejo para la estación"],
  "troubleshooting": {"problema": "solución"},
  "confidence": 0-100,
  "reasoning": "por qué este plan"
}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WateringCare {
    pub frequency: String,
    pub amount: String,
    pub notes: String,
}

impl Default for WateringCare {
    fn default() -> Self {
        Self {
            frequency: "Cada 7-10 días".into(),
            amount: "Hasta que drene por los agujeros de la maceta".into(),
            notes: "Riega cuando los primeros 2-3 cm de sustrato estén secos".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SunlightCare {
    pub level: String,
    pub hours: String,
    pub notes: String,
}

impl Default for SunlightCare {
    fn default() -> Self {
        Self {
            level: "Luz indirecta brillante".into(),
            hours: "6-8 horas".into(),
            notes: "Evita el sol directo del mediodía".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HumidityCare {
    pub level: String,
    pub notes: String,
}

impl Default for HumidityCare {
    fn default() -> Self {
        Self {
            level: "Media (40-60%)".into(),
            notes: "Aleja la planta de calefactores y aire acondicionado".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemperatureCare {
    pub range: String,
    pub notes: String,
}

impl Default for TemperatureCare {
    fn default() -> Self {
        Self {
            range: "18-24 °C".into(),
            notes: "Protégela de corrientes de aire frío".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FertilizingCare {
    pub frequency: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub notes: String,
}

impl Default for FertilizingCare {
    fn default() -> Self {
        Self {
            frequency: "Cada 4 semanas en primavera y verano".into(),
            kind: "Fertilizante líquido equilibrado diluido a la mitad".into(),
            notes: "Suspende el abono en invierno".into(),
        }
    }
}

/// Per-aspect care instructions. Missing aspects keep the generic defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CareProfile {
    pub watering: WateringCare,
    pub sunlight: SunlightCare,
    pub humidity: HumidityCare,
    pub temperature: TemperatureCare,
    pub fertilizing: FertilizingCare,
}

/// Care agent reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CareRecommendation {
    pub care_profile: CareProfile,
    #[serde(deserialize_with = "lenient_list")]
    pub immediate_actions: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub weekly_routine: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub seasonal_tips: Vec<String>,
    #[serde(deserialize_with = "lenient_text_map")]
    pub troubleshooting: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
    pub reasoning: String,
}

impl AgentReport for CareRecommendation {
    const FALLBACK_CONFIDENCE: u8 = 80;

    fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    fn reasoning(&self) -> Option<&str> {
        Some(self.reasoning.as_str())
    }
}

/// Text-only agent on the cheaper model; moderate temperature
pub struct CareRecommendationAgent {
    client: Arc<dyn LlmClient>,
    settings: AgentSettings,
}

impl CareRecommendationAgent {
    pub const NAME: &'static str = "care_recommendation";

    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self::with_settings(client, Self::default_settings(model))
    }

    pub fn with_settings(client: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self { client, settings }
    }

    pub fn default_settings(model: impl Into<String>) -> AgentSettings {
        AgentSettings {
            model: model.into(),
            temperature: 0.5,
            max_tokens: 800,
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
        season: Season,
        context: &AnalysisContext,
    ) -> AgentResponse<CareRecommendation> {
        let prompt = build_prompt(species, health, season, context);
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        invoke_json(Self::NAME, self.client.as_ref(), &self.settings, messages).await
    }
}

fn build_prompt(
    species: &AgentResponse<SpeciesIdentification>,
    health: &AgentResponse<HealthDiagnosis>,
    season: Season,
    context: &AnalysisContext,
) -> String {
    let species_line = species
        .report()
        .map(|s| s.describe())
        .unwrap_or_else(|| "especie desconocida".into());
    let health_line = health
        .report()
        .map(|h| h.describe())
        .unwrap_or_else(|| "sin diagnóstico de salud".into());

    let mut prompt = format!(
        "Crea un plan de cuidados para esta planta.\nEspecie: {}\nSalud: {}\nEstación actual: {}",
        species_line, health_line, season
    );
    let notes = context.care_notes();
    if !notes.is_empty() {
        prompt.push('\n');
        prompt.push_str(&notes);
    }
    prompt.push_str("\n\n");
    prompt.push_str(RESPONSE_SHAPE);
    prompt
}
