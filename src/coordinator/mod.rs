// src/coordinator/mod.rs
// Runs the four agents as a layered stage graph and synthesizes the result

mod ledger;
mod pipeline;
mod synthesis;

pub use ledger::{CostLedger, StageCost};
pub use pipeline::{PipelinePlan, Stage, StageSpec};
pub use synthesis::{
    AgentEnvelopes, AnalysisMeta, HealthSummary, PersonalitySummary, SynthesizedAnalysis,
    overall_confidence, synthesize,
};

use crate::agents::{
    AgentResponse, AnalysisContext, CareRecommendation, CareRecommendationAgent, HealthDiagnosis,
    HealthDiagnosisAgent, PersonalityAgent, PlantPersonality, SpeciesIdentification,
    SpeciesIdentificationAgent,
};
use crate::config::EnvConfig;
use crate::error::{PlantitasError, Result};
use crate::llm::{LlmClient, OpenAiClient};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Raw envelopes from every agent, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResults {
    pub species: AgentResponse<SpeciesIdentification>,
    pub health: AgentResponse<HealthDiagnosis>,
    pub care: AgentResponse<CareRecommendation>,
    pub personality: AgentResponse<PlantPersonality>,
}

impl AgentResults {
    pub fn total_cost(&self) -> u32 {
        [
            self.species.cost,
            self.health.cost,
            self.care.cost,
            self.personality.cost,
        ]
        .into_iter()
        .fold(0u32, u32::saturating_add)
    }

    fn envelopes(&self) -> AgentEnvelopes<'_> {
        AgentEnvelopes {
            species: &self.species,
            health: &self.health,
            care: &self.care,
            personality: &self.personality,
        }
    }
}

/// Top-level result of `analyze_complete`.
///
/// `success` is false only when the pipeline itself broke; individual agent
/// failures show up as lowered confidence and in `agent_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub success: bool,
    pub data: Option<SynthesizedAnalysis>,
    pub total_cost: u32,
    pub agent_results: Option<AgentResults>,
    pub summary: String,
    pub ledger: CostLedger,
}

impl AnalysisOutcome {
    fn failed(err: &PlantitasError) -> Self {
        Self {
            success: false,
            data: None,
            total_cost: 0,
            agent_results: None,
            summary: format!(
                "No se pudo completar el análisis ({}). Inténtalo de nuevo más tarde.",
                err
            ),
            ledger: CostLedger::new(),
        }
    }
}

/// Output of one stage run
enum StageRun {
    Species(AgentResponse<SpeciesIdentification>),
    Health(AgentResponse<HealthDiagnosis>),
    Care(AgentResponse<CareRecommendation>),
    Personality(AgentResponse<PlantPersonality>),
}

impl StageRun {
    fn outcome(&self) -> (bool, u32) {
        match self {
            Self::Species(r) => (r.success, r.cost),
            Self::Health(r) => (r.success, r.cost),
            Self::Care(r) => (r.success, r.cost),
            Self::Personality(r) => (r.success, r.cost),
        }
    }
}

#[derive(Default)]
struct StageOutputs {
    species: Option<AgentResponse<SpeciesIdentification>>,
    health: Option<AgentResponse<HealthDiagnosis>>,
    care: Option<AgentResponse<CareRecommendation>>,
    personality: Option<AgentResponse<PlantPersonality>>,
}

impl StageOutputs {
    fn store(&mut self, run: StageRun) {
        match run {
            StageRun::Species(r) => self.species = Some(r),
            StageRun::Health(r) => self.health = Some(r),
            StageRun::Care(r) => self.care = Some(r),
            StageRun::Personality(r) => self.personality = Some(r),
        }
    }

    fn into_results(self) -> Result<AgentResults> {
        Ok(AgentResults {
            species: self.species.ok_or_else(|| missing_output(Stage::Species))?,
            health: self.health.ok_or_else(|| missing_output(Stage::Health))?,
            care: self.care.ok_or_else(|| missing_output(Stage::Care))?,
            personality: self
                .personality
                .ok_or_else(|| missing_output(Stage::Personality))?,
        })
    }
}

fn missing_output(stage: Stage) -> PlantitasError {
    PlantitasError::Pipeline(format!("stage {} produced no output", stage))
}

fn missing_dependency(stage: Stage, dependency: Stage) -> PlantitasError {
    PlantitasError::Pipeline(format!(
        "stage {} ran before {} output was available",
        stage, dependency
    ))
}

/// Orchestrates species, health, care and personality agents for one photo
pub struct PlantAnalysisCoordinator {
    species: SpeciesIdentificationAgent,
    health: HealthDiagnosisAgent,
    care: CareRecommendationAgent,
    personality: PersonalityAgent,
    plan: Option<PipelinePlan>,
}

impl PlantAnalysisCoordinator {
    /// Vision model for species and health, text model for care and personality
    pub fn new(
        client: Arc<dyn LlmClient>,
        vision_model: impl Into<String>,
        text_model: impl Into<String>,
    ) -> Self {
        let vision_model = vision_model.into();
        let text_model = text_model.into();
        Self {
            species: SpeciesIdentificationAgent::new(client.clone(), vision_model.clone()),
            health: HealthDiagnosisAgent::new(client.clone(), vision_model),
            care: CareRecommendationAgent::new(client.clone(), text_model.clone()),
            personality: PersonalityAgent::new(client, text_model),
            plan: None,
        }
    }

    pub fn from_config(config: &EnvConfig) -> Self {
        let client: Arc<dyn LlmClient> = Arc::new(OpenAiClient::from_config(config));
        Self::new(client, &config.vision_model, &config.text_model)
    }

    /// Replace the standard stage plan
    pub fn with_plan(mut self, plan: PipelinePlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Run every agent and merge their reports into one plant record.
    /// An empty `image_url` falls back to `context.image_url`.
    /// Never returns an error; see `AnalysisOutcome::success`.
    #[instrument(skip_all, fields(image_url_len = image_url.len()))]
    pub async fn analyze_complete(
        &self,
        image_url: &str,
        context: Option<AnalysisContext>,
    ) -> AnalysisOutcome {
        let started = Instant::now();
        let context = context.unwrap_or_default();
        let image_url = effective_image_url(image_url, &context);

        match self.run(image_url, &context).await {
            Ok((results, ledger)) => {
                let data = synthesize(&results.envelopes(), Utc::now());
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let summary = ledger.summary(elapsed_ms);
                info!(
                    agent_success = data.analysis.agent_success,
                    confidence = data.confidence,
                    tokens = results.total_cost(),
                    duration_ms = elapsed_ms,
                    "Plant analysis complete"
                );
                AnalysisOutcome {
                    success: true,
                    total_cost: results.total_cost(),
                    data: Some(data),
                    agent_results: Some(results),
                    summary,
                    ledger,
                }
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Plant analysis failed");
                AnalysisOutcome::failed(&e)
            }
        }
    }

    async fn run(
        &self,
        image_url: &str,
        context: &AnalysisContext,
    ) -> Result<(AgentResults, CostLedger)> {
        let plan = match &self.plan {
            Some(plan) => plan.clone(),
            None => PipelinePlan::standard()?,
        };

        let mut outputs = StageOutputs::default();
        let mut ledger = CostLedger::new();

        for layer in plan.layers() {
            debug!(stages = ?layer, "Running pipeline layer");
            let done = &outputs;
            let runs = join_all(layer.iter().map(|stage| async move {
                let started = Instant::now();
                let run = self.run_stage(*stage, image_url, context, done).await;
                (*stage, run, started.elapsed().as_millis() as u64)
            }))
            .await;

            for (stage, run, duration_ms) in runs {
                let run = run?;
                let (success, tokens) = run.outcome();
                debug!(stage = %stage, success, tokens, duration_ms, "Stage finished");
                ledger.record(stage, success, tokens, duration_ms);
                outputs.store(run);
            }
        }

        Ok((outputs.into_results()?, ledger))
    }

    async fn run_stage(
        &self,
        stage: Stage,
        image_url: &str,
        context: &AnalysisContext,
        done: &StageOutputs,
    ) -> Result<StageRun> {
        let run = match stage {
            Stage::Species => {
                let resp = self.species.analyze(image_url).await;
                if !resp.success {
                    warn!(reason = %resp.reasoning, "Species identification failed, continuing with unknown species");
                }
                StageRun::Species(resp)
            }
            Stage::Health => {
                let species = done
                    .species
                    .as_ref()
                    .ok_or_else(|| missing_dependency(stage, Stage::Species))?;
                StageRun::Health(self.health.analyze(image_url, species.report()).await)
            }
            Stage::Care => {
                let (species, health) = upstream(stage, done)?;
                StageRun::Care(
                    self.care
                        .analyze(species, health, context.season(), context)
                        .await,
                )
            }
            Stage::Personality => {
                let (species, health) = upstream(stage, done)?;
                StageRun::Personality(self.personality.analyze(species, health).await)
            }
        };
        Ok(run)
    }
}

fn effective_image_url<'a>(image_url: &'a str, context: &'a AnalysisContext) -> &'a str {
    if !image_url.trim().is_empty() {
        return image_url;
    }
    context.image_url.as_deref().unwrap_or(image_url)
}

fn upstream(
    stage: Stage,
    done: &StageOutputs,
) -> Result<(
    &AgentResponse<SpeciesIdentification>,
    &AgentResponse<HealthDiagnosis>,
)> {
    let species = done
        .species
        .as_ref()
        .ok_or_else(|| missing_dependency(stage, Stage::Species))?;
    let health = done
        .health
        .as_ref()
        .ok_or_else(|| missing_dependency(stage, Stage::Health))?;
    Ok((species, health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{ScriptedClient, transport_error};

    #[tokio::test]
    async fn test_unreachable_backend_still_succeeds_with_defaults() {
        let client = Arc::new(ScriptedClient::failing(transport_error));
        let coordinator = PlantAnalysisCoordinator::new(client.clone(), "gpt-4o", "gpt-4o-mini");
        let outcome = coordinator.analyze_complete("https://img/p.jpg", None).await;

        assert!(outcome.success);
        assert_eq!(outcome.total_cost, 0);
        let data = outcome.data.unwrap();
        assert_eq!(data.confidence, 0);
        assert_eq!(data.analysis.agent_success, 0);
        assert_eq!(data.species, "Especie no identificada");
        assert_eq!(client.requests().len(), 4);
        assert_eq!(outcome.ledger.len(), 4);
    }

    #[tokio::test]
    async fn test_incomplete_plan_is_total_failure() {
        let client = Arc::new(ScriptedClient::failing(transport_error));
        let plan = PipelinePlan::resolve(&[StageSpec::new(Stage::Species, &[])]).unwrap();
        let coordinator =
            PlantAnalysisCoordinator::new(client, "gpt-4o", "gpt-4o-mini").with_plan(plan);
        let outcome = coordinator.analyze_complete("https://img/p.jpg", None).await;

        assert!(!outcome.success);
        assert!(outcome.data.is_none());
        assert!(outcome.agent_results.is_none());
        assert_eq!(outcome.total_cost, 0);
        assert!(outcome.summary.contains("Inténtalo de nuevo"));
    }

    #[tokio::test]
    async fn test_stage_without_declared_dependency_fails() {
        let client = Arc::new(ScriptedClient::failing(transport_error));
        let plan = PipelinePlan::resolve(&[
            StageSpec::new(Stage::Species, &[]),
            StageSpec::new(Stage::Health, &[]),
        ])
        .unwrap();
        let coordinator =
            PlantAnalysisCoordinator::new(client, "gpt-4o", "gpt-4o-mini").with_plan(plan);
        let outcome = coordinator.analyze_complete("https://img/p.jpg", None).await;

        assert!(!outcome.success);
        assert!(outcome.summary.contains("health"));
    }

    #[tokio::test]
    async fn test_context_image_url_used_when_argument_empty() {
        let client = Arc::new(ScriptedClient::failing(transport_error));
        let context = AnalysisContext {
            image_url: Some("https://img/from-context.jpg".into()),
            ..Default::default()
        };
        PlantAnalysisCoordinator::new(client.clone(), "gpt-4o", "gpt-4o-mini")
            .analyze_complete("", Some(context))
            .await;

        let species_request = &client.requests()[0];
        let image = species_request.messages[1].content.image().unwrap();
        assert_eq!(image.url, "https://img/from-context.jpg");
    }

    #[test]
    fn test_argument_image_url_wins_over_context() {
        let context = AnalysisContext {
            image_url: Some("https://img/b.jpg".into()),
            ..Default::default()
        };
        assert_eq!(effective_image_url("https://img/a.jpg", &context), "https://img/a.jpg");
        assert_eq!(effective_image_url(" ", &AnalysisContext::default()), " ");
    }

    #[test]
    fn test_agent_results_total_cost() {
        let results = AgentResults {
            species: AgentResponse::succeeded(SpeciesIdentification::default(), 90, "ok", 250),
            health: AgentResponse::failed("x"),
            care: AgentResponse::succeeded(CareRecommendation::default(), 80, "ok", 700),
            personality: AgentResponse::succeeded(PlantPersonality::default(), 85, "ok", 380),
        };
        assert_eq!(results.total_cost(), 1330);
    }
}
