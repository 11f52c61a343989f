// src/chat/mod.rs
// Conversation with an analysed plant, in the voice of its persona

mod emotion;

pub use emotion::{Emotion, detect_emotion};

use crate::agents::{AgentResponse, AgentSettings, HealthStatus};
use crate::coordinator::{PersonalitySummary, SynthesizedAnalysis};
use crate::error::{PlantitasError, Result};
use crate::llm::{ChatRequest, LlmClient, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Turns of history sent with each message
pub const HISTORY_WINDOW: usize = 4;
/// Hard cap on reply length; the prompt asks for 100 words
pub const MAX_REPLY_WORDS: usize = 120;
const REPLY_CONFIDENCE: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Plant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn plant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Plant,
            content: content.into(),
        }
    }

    fn to_message(&self) -> Message {
        match self.role {
            ChatRole::User => Message::user(self.content.clone()),
            ChatRole::Plant => Message::assistant(self.content.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    pub emotion: Emotion,
}

/// What the responder needs to know about the plant it speaks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantProfile {
    pub name: String,
    pub species: String,
    pub common_name: String,
    pub personality: PersonalitySummary,
    pub catchphrases: Vec<String>,
    pub health: HealthStatus,
    pub health_score: u8,
}

impl PlantProfile {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.name = name.trim().to_string();
        }
        self
    }
}

impl From<&SynthesizedAnalysis> for PlantProfile {
    fn from(analysis: &SynthesizedAnalysis) -> Self {
        Self {
            name: analysis.common_name.clone(),
            species: analysis.species.clone(),
            common_name: analysis.common_name.clone(),
            personality: analysis.personality.clone(),
            catchphrases: analysis.catchphrases.clone(),
            health: analysis.health.overall_health,
            health_score: analysis.health.health_score,
        }
    }
}

/// Single-call chat in plain text mode
pub struct PlantChatResponder {
    client: Arc<dyn LlmClient>,
    settings: AgentSettings,
}

impl PlantChatResponder {
    pub const NAME: &'static str = "plant_chat";

    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self::with_settings(client, Self::default_settings(model))
    }

    pub fn with_settings(client: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self { client, settings }
    }

    pub fn default_settings(model: impl Into<String>) -> AgentSettings {
        AgentSettings {
            model: model.into(),
            temperature: 0.8,
            max_tokens: 150,
            image_detail: None,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Answer `message` as the plant. Only the last four history turns are sent.
    #[instrument(skip_all, fields(plant = %profile.name, history_len = history.len()))]
    pub async fn generate_plant_response(
        &self,
        message: &str,
        profile: &PlantProfile,
        history: &[ChatTurn],
    ) -> AgentResponse<ChatReply> {
        if message.trim().is_empty() {
            return AgentResponse::failed(format!("Error en {}: mensaje vacío", Self::NAME));
        }

        let request = self.build_request(message, profile, history);
        match self.call(request).await {
            Ok((content, cost)) => {
                let emotion = detect_emotion(&content);
                debug!(emotion = %emotion, cost, "Plant replied");
                AgentResponse::succeeded(
                    ChatReply { content, emotion },
                    REPLY_CONFIDENCE,
                    "Respuesta generada",
                    cost,
                )
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Plant chat failed");
                AgentResponse::failed(format!("Error en {}: {}", Self::NAME, e))
            }
        }
    }

    fn build_request(&self, message: &str, profile: &PlantProfile, history: &[ChatTurn]) -> ChatRequest {
        let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::system(persona_prompt(profile)));
        messages.extend(recent.iter().map(ChatTurn::to_message));
        messages.push(Message::user(message.trim()));

        ChatRequest::new(self.settings.model.clone(), messages)
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature)
    }

    async fn call(&self, request: ChatRequest) -> Result<(String, u32)> {
        let result = self.client.chat(request).await?;
        let content = result
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(PlantitasError::EmptyContent)?;
        let cost = result
            .usage
            .map(|u| u.total_tokens)
            .filter(|t| *t > 0)
            .unwrap_or(self.settings.max_tokens);
        Ok((cap_words(content, MAX_REPLY_WORDS), cost))
    }
}

fn persona_prompt(profile: &PlantProfile) -> String {
    let persona = &profile.personality;
    let mut prompt = format!(
        "Eres {}, una planta {} ({}). Hablas en primera persona como la planta.\n\
         Energía: {}. Estilo: {}; tu forma de hablar es {}.\n\
         Estado de ánimo: {}.\n\
         Salud: {} ({}/100).",
        profile.name,
        profile.common_name,
        profile.species,
        persona.energy_level,
        persona.communication_style,
        persona.communication_style.voice(),
        persona.mood,
        health_feeling(profile.health),
        profile.health_score,
    );
    if !persona.interests.is_empty() {
        prompt.push_str(&format!("\nTe interesa: {}.", persona.interests.join(", ")));
    }
    if !profile.catchphrases.is_empty() {
        prompt.push_str(&format!(
            "\nFrases típicas que puedes usar: {}.",
            profile.catchphrases.join(" | ")
        ));
    }
    prompt.push_str(
        "\nResponde en español, con un máximo de 100 palabras. \
         Si te preguntan por cuidados, da consejos concretos. Usa emojis con moderación.",
    );
    prompt
}

fn health_feeling(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Excellent => "te sientes de maravilla",
        HealthStatus::Good => "te sientes bien",
        HealthStatus::Fair => "estás algo decaída",
        HealthStatus::Poor => "te sientes mal y necesitas ayuda",
        HealthStatus::Critical => "estás muy grave",
    }
}

fn cap_words(text: &str, max: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max {
        return text.to_string();
    }
    format!("{}…", words[..max].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{CommunicationStyle, EnergyLevel};
    use crate::llm::testing::{ScriptedClient, transport_error};

    fn profile() -> PlantProfile {
        PlantProfile {
            name: "Rita".into(),
            species: "Epipremnum aureum".into(),
            common_name: "Potus".into(),
            personality: PersonalitySummary {
                energy_level: EnergyLevel::Alta,
                communication_style: CommunicationStyle::Dramatico,
                interests: vec!["trepar".into()],
                mood: "radiante".into(),
            },
            catchphrases: vec!["¡Qué drama sin agua!".into()],
            health: HealthStatus::Fair,
            health_score: 62,
        }
    }

    fn history(n: usize) -> Vec<ChatTurn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatTurn::user(format!("pregunta {}", i))
                } else {
                    ChatTurn::plant(format!("respuesta {}", i))
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_reply_with_emotion() {
        let client = Arc::new(ScriptedClient::content("¡Hola! Estoy feliz de verte 😊", Some(95)));
        let responder = PlantChatResponder::new(client.clone(), "gpt-4o-mini");
        let resp = responder
            .generate_plant_response("¿Cómo estás?", &profile(), &[])
            .await;

        assert!(resp.success);
        assert_eq!(resp.cost, 95);
        let reply = resp.data.unwrap();
        assert_eq!(reply.emotion, Emotion::Alegre);
        assert!(reply.content.starts_with("¡Hola!"));

        let req = client.last_request();
        assert_eq!(req.temperature, Some(0.8));
        assert_eq!(req.max_tokens, Some(150));
        assert!(req.response_format.is_none());
    }

    #[tokio::test]
    async fn test_only_last_four_turns_sent() {
        let client = Arc::new(ScriptedClient::content("Bien.", Some(10)));
        let responder = PlantChatResponder::new(client.clone(), "gpt-4o-mini");
        responder
            .generate_plant_response("¿Y hoy?", &profile(), &history(7))
            .await;

        let req = client.last_request();
        // system + 4 turns + new message
        assert_eq!(req.messages.len(), 6);
        assert_eq!(req.messages[1].content.text(), "respuesta 3");
        assert_eq!(req.messages[1].role, "assistant");
        assert_eq!(req.messages[4].content.text(), "pregunta 6");
        assert_eq!(req.messages[5].content.text(), "¿Y hoy?");
    }

    #[tokio::test]
    async fn test_persona_in_system_prompt() {
        let client = Arc::new(ScriptedClient::content("Ok", None));
        let responder = PlantChatResponder::new(client.clone(), "gpt-4o-mini");
        let resp = responder.generate_plant_response("hola", &profile(), &[]).await;
        assert_eq!(resp.cost, 150);

        let system = client.last_request().messages[0].content.text();
        assert!(system.contains("Eres Rita"));
        assert!(system.contains("dramatico"));
        assert!(system.contains("telenovela"));
        assert!(system.contains("62/100"));
        assert!(system.contains("¡Qué drama sin agua!"));
    }

    #[tokio::test]
    async fn test_empty_reply_fails() {
        let client = Arc::new(ScriptedClient::content("   ", Some(3)));
        let resp = PlantChatResponder::new(client, "gpt-4o-mini")
            .generate_plant_response("hola", &profile(), &[])
            .await;
        assert!(!resp.success);
        assert_eq!(resp.cost, 0);
        assert!(resp.reasoning.contains("empty content"));

        let client = Arc::new(ScriptedClient::empty());
        let resp = PlantChatResponder::new(client, "gpt-4o-mini")
            .generate_plant_response("hola", &profile(), &[])
            .await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn test_empty_message_skips_call() {
        let client = Arc::new(ScriptedClient::content("Hola", Some(3)));
        let resp = PlantChatResponder::new(client.clone(), "gpt-4o-mini")
            .generate_plant_response("  ", &profile(), &[])
            .await;
        assert!(!resp.success);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let client = Arc::new(ScriptedClient::failing(transport_error));
        let resp = PlantChatResponder::new(client, "gpt-4o-mini")
            .generate_plant_response("hola", &profile(), &[])
            .await;
        assert!(!resp.success);
        assert!(resp.reasoning.contains("503"));
    }

    #[test]
    fn test_cap_words() {
        assert_eq!(cap_words("uno dos tres", 5), "uno dos tres");
        assert_eq!(cap_words("uno dos tres cuatro", 2), "uno dos…");
    }

    #[test]
    fn test_profile_from_analysis_with_name() {
        let json = serde_json::json!({
            "species": "Ficus lyrata",
            "commonName": "Higuera hoja de violín",
            "family": "Moraceae",
            "confidence": 80,
            "health": {
                "overallHealth": "poor", "healthScore": 30, "symptoms": [],
                "diseases": [], "urgentActions": [], "prognosis": "Reservado"
            },
            "careProfile": {},
            "personality": {
                "energyLevel": "baja", "communicationStyle": "sabio",
                "interests": ["leer"], "mood": "pensativa"
            },
            "catchphrases": ["Paciencia"],
            "immediateActions": [], "weeklyRoutine": [], "seasonalTips": [],
            "troubleshooting": {},
            "analysis": {
                "timestamp": "2026-04-01T10:00:00Z", "agentSuccess": 3,
                "totalAgents": 4, "overallConfidence": 80
            }
        });
        let analysis: SynthesizedAnalysis = serde_json::from_value(json).unwrap();
        let profile = PlantProfile::from(&analysis).with_name("Violeta");

        assert_eq!(profile.name, "Violeta");
        assert_eq!(profile.health, HealthStatus::Poor);
        assert_eq!(profile.personality.communication_style, CommunicationStyle::Sabio);
        assert_eq!(PlantProfile::from(&analysis).with_name(" ").name, "Higuera hoja de violín");
    }
}
