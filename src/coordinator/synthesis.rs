// src/coordinator/synthesis.rs
// Merge the four agent envelopes into one fully defaulted plant record

use crate::agents::{
    AgentResponse, CareProfile, CareRecommendation, CommunicationStyle, EnergyLevel,
    HealthDiagnosis, HealthStatus, PlantPersonality, SpeciesIdentification,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SPECIES: &str = "Especie no identificada";
pub const DEFAULT_COMMON_NAME: &str = "Planta misteriosa";
pub const DEFAULT_HEALTH_SCORE: u8 = 75;
pub const DEFAULT_PROGNOSIS: &str = "Sin diagnóstico detallado; observa la planta unos días";
pub const DEFAULT_MOOD: &str = "tranquila";
pub const TOTAL_AGENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub overall_health: HealthStatus,
    pub health_score: u8,
    pub symptoms: Vec<String>,
    pub diseases: Vec<String>,
    pub urgent_actions: Vec<String>,
    pub prognosis: String,
}

impl Default for HealthSummary {
    fn default() -> Self {
        Self {
            overall_health: HealthStatus::Good,
            health_score: DEFAULT_HEALTH_SCORE,
            symptoms: Vec::new(),
            diseases: Vec::new(),
            urgent_actions: Vec::new(),
            prognosis: DEFAULT_PROGNOSIS.into(),
        }
    }
}

impl From<&HealthDiagnosis> for HealthSummary {
    fn from(diagnosis: &HealthDiagnosis) -> Self {
        let fallback = Self::default();
        Self {
            overall_health: diagnosis.status().unwrap_or(fallback.overall_health),
            health_score: diagnosis.score().unwrap_or(fallback.health_score),
            symptoms: diagnosis.symptoms.clone(),
            diseases: diagnosis.diseases.clone(),
            urgent_actions: diagnosis.urgent_actions.clone(),
            prognosis: non_blank(&diagnosis.prognosis).unwrap_or(fallback.prognosis),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalitySummary {
    pub energy_level: EnergyLevel,
    pub communication_style: CommunicationStyle,
    pub interests: Vec<String>,
    pub mood: String,
}

impl Default for PersonalitySummary {
    fn default() -> Self {
        Self {
            energy_level: EnergyLevel::Media,
            communication_style: CommunicationStyle::Amigable,
            interests: vec!["tomar el sol".into(), "crecer".into()],
            mood: DEFAULT_MOOD.into(),
        }
    }
}

impl From<&PlantPersonality> for PersonalitySummary {
    fn from(persona: &PlantPersonality) -> Self {
        let fallback = Self::default();
        Self {
            energy_level: persona.energy_level,
            communication_style: persona.communication_style,
            interests: non_empty(&persona.interests).unwrap_or(fallback.interests),
            mood: non_blank(&persona.mood).unwrap_or(fallback.mood),
        }
    }
}

/// Run statistics attached to every synthesized record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMeta {
    pub timestamp: DateTime<Utc>,
    pub agent_success: usize,
    pub total_agents: usize,
    pub overall_confidence: u8,
}

/// The plant record handed back to callers. No field is ever left unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedAnalysis {
    pub species: String,
    pub common_name: String,
    pub family: String,
    pub confidence: u8,
    pub health: HealthSummary,
    pub care_profile: CareProfile,
    pub personality: PersonalitySummary,
    pub catchphrases: Vec<String>,
    pub immediate_actions: Vec<String>,
    pub weekly_routine: Vec<String>,
    pub seasonal_tips: Vec<String>,
    pub troubleshooting: BTreeMap<String, String>,
    pub analysis: AnalysisMeta,
}

/// Borrowed view of the four envelopes for synthesis
pub struct AgentEnvelopes<'a> {
    pub species: &'a AgentResponse<SpeciesIdentification>,
    pub health: &'a AgentResponse<HealthDiagnosis>,
    pub care: &'a AgentResponse<CareRecommendation>,
    pub personality: &'a AgentResponse<PlantPersonality>,
}

impl AgentEnvelopes<'_> {
    fn outcomes(&self) -> [(bool, u8); TOTAL_AGENTS] {
        [
            (self.species.success, self.species.confidence),
            (self.health.success, self.health.confidence),
            (self.care.success, self.care.confidence),
            (self.personality.success, self.personality.confidence),
        ]
    }
}

/// Rounded mean confidence of the agents that succeeded; 0 when none did
pub fn overall_confidence(outcomes: &[(bool, u8)]) -> u8 {
    let successful: Vec<u32> = outcomes
        .iter()
        .filter(|(ok, _)| *ok)
        .map(|(_, c)| u32::from(*c))
        .collect();
    if successful.is_empty() {
        return 0;
    }
    let mean = successful.iter().sum::<u32>() as f64 / successful.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}

pub fn synthesize(envelopes: &AgentEnvelopes<'_>, timestamp: DateTime<Utc>) -> SynthesizedAnalysis {
    let outcomes = envelopes.outcomes();
    let confidence = overall_confidence(&outcomes);
    let agent_success = outcomes.iter().filter(|(ok, _)| *ok).count();

    let species = envelopes.species.report();
    let care = envelopes.care.report();
    let persona = envelopes.personality.report();

    SynthesizedAnalysis {
        species: species
            .and_then(|s| non_blank(&s.species))
            .unwrap_or_else(|| DEFAULT_SPECIES.into()),
        common_name: species
            .and_then(|s| non_blank(&s.common_name))
            .unwrap_or_else(|| DEFAULT_COMMON_NAME.into()),
        family: species
            .and_then(|s| non_blank(&s.family))
            .unwrap_or_else(|| "Desconocida".into()),
        confidence,
        health: envelopes
            .health
            .report()
            .map(HealthSummary::from)
            .unwrap_or_default(),
        care_profile: care.map(|c| c.care_profile.clone()).unwrap_or_default(),
        personality: persona.map(PersonalitySummary::from).unwrap_or_default(),
        catchphrases: persona
            .and_then(|p| non_empty(&p.catchphrases))
            .unwrap_or_else(default_catchphrases),
        immediate_actions: care
            .and_then(|c| non_empty(&c.immediate_actions))
            .unwrap_or_else(default_immediate_actions),
        weekly_routine: care
            .and_then(|c| non_empty(&c.weekly_routine))
            .unwrap_or_else(default_weekly_routine),
        seasonal_tips: care
            .and_then(|c| non_empty(&c.seasonal_tips))
            .unwrap_or_else(default_seasonal_tips),
        troubleshooting: care.map(|c| c.troubleshooting.clone()).unwrap_or_default(),
        analysis: AnalysisMeta {
            timestamp,
            agent_success,
            total_agents: TOTAL_AGENTS,
            overall_confidence: confidence,
        },
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn non_empty(items: &[String]) -> Option<Vec<String>> {
    let kept: Vec<String> = items.iter().filter_map(|s| non_blank(s)).collect();
    (!kept.is_empty()).then_some(kept)
}

fn default_catchphrases() -> Vec<String> {
    vec!["¡Hola! Cuídame bien".into(), "Un poquito de agua, por favor".into()]
}

fn default_immediate_actions() -> Vec<String> {
    vec!["Revisa la humedad del sustrato antes de regar".into()]
}

fn default_weekly_routine() -> Vec<String> {
    vec![
        "Comprueba la humedad del sustrato".into(),
        "Gira la maceta para un crecimiento parejo".into(),
    ]
}

fn default_seasonal_tips() -> Vec<String> {
    vec!["Ajusta el riego según la temperatura de la estación".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed<T>() -> AgentResponse<T> {
        AgentResponse::failed("Error en test: boom")
    }

    #[test]
    fn test_overall_confidence_mean_of_successes() {
        assert_eq!(
            overall_confidence(&[(true, 90), (true, 80), (true, 70), (true, 60)]),
            75
        );
        assert_eq!(overall_confidence(&[(true, 90), (false, 0), (true, 71)]), 81);
        assert_eq!(overall_confidence(&[(false, 0), (false, 0)]), 0);
        assert_eq!(overall_confidence(&[]), 0);
    }

    #[test]
    fn test_all_failed_is_fully_defaulted() {
        let (s, h, c, p) = (failed(), failed(), failed(), failed());
        let record = synthesize(
            &AgentEnvelopes {
                species: &s,
                health: &h,
                care: &c,
                personality: &p,
            },
            Utc::now(),
        );

        assert_eq!(record.species, DEFAULT_SPECIES);
        assert_eq!(record.common_name, DEFAULT_COMMON_NAME);
        assert_eq!(record.confidence, 0);
        assert_eq!(record.health, HealthSummary::default());
        assert_eq!(record.personality.mood, DEFAULT_MOOD);
        assert!(!record.weekly_routine.is_empty());
        assert!(!record.catchphrases.is_empty());
        assert_eq!(record.analysis.agent_success, 0);
        assert_eq!(record.analysis.total_agents, 4);
    }

    #[test]
    fn test_failed_species_keeps_health() {
        let s = failed();
        let h = AgentResponse::succeeded(
            HealthDiagnosis {
                overall_health: Some(HealthStatus::Poor),
                health_score: Some(35.0),
                symptoms: vec!["hojas caídas".into()],
                prognosis: "Reservado".into(),
                ..Default::default()
            },
            70,
            "ok",
            500,
        );
        let (c, p) = (failed(), failed());
        let record = synthesize(
            &AgentEnvelopes {
                species: &s,
                health: &h,
                care: &c,
                personality: &p,
            },
            Utc::now(),
        );

        assert_eq!(record.species, DEFAULT_SPECIES);
        assert_eq!(record.health.overall_health, HealthStatus::Poor);
        assert_eq!(record.health.health_score, 35);
        assert_eq!(record.health.symptoms, vec!["hojas caídas"]);
        assert_eq!(record.confidence, 70);
    }

    #[test]
    fn test_blank_fields_fall_back() {
        let s = AgentResponse::succeeded(
            SpeciesIdentification {
                species: "Ficus lyrata".into(),
                common_name: "  ".into(),
                ..Default::default()
            },
            60,
            "ok",
            1,
        );
        let p = AgentResponse::succeeded(
            PlantPersonality {
                mood: String::new(),
                catchphrases: vec!["".into()],
                communication_style: CommunicationStyle::Sabio,
                ..Default::default()
            },
            85,
            "ok",
            1,
        );
        let (h, c) = (failed(), failed());
        let record = synthesize(
            &AgentEnvelopes {
                species: &s,
                health: &h,
                care: &c,
                personality: &p,
            },
            Utc::now(),
        );

        assert_eq!(record.species, "Ficus lyrata");
        assert_eq!(record.common_name, DEFAULT_COMMON_NAME);
        assert_eq!(record.personality.communication_style, CommunicationStyle::Sabio);
        assert_eq!(record.personality.mood, DEFAULT_MOOD);
        assert_eq!(record.catchphrases, default_catchphrases());
    }

    #[test]
    fn test_serializes_camel_case() {
        let (s, h, c, p) = (failed(), failed(), failed(), failed());
        let record = synthesize(
            &AgentEnvelopes {
                species: &s,
                health: &h,
                care: &c,
                personality: &p,
            },
            Utc::now(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["commonName"], DEFAULT_COMMON_NAME);
        assert_eq!(value["health"]["overallHealth"], "good");
        assert_eq!(value["health"]["healthScore"], 75);
        assert_eq!(value["analysis"]["totalAgents"], 4);
        assert!(value["careProfile"]["watering"]["frequency"].is_string());
    }
}
