// tests/pipeline.rs
// End-to-end coordinator behaviour against a scripted inference client


use plantitas::agents::{AnalysisContext, HealthStatus, Season};
use plantitas::coordinator::{PipelinePlan, PlantAnalysisCoordinator, Stage, StageSpec};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{Caller, MockLlmClient, care_reply, personality_reply, species_reply};

const IMAGE: &str = "https://example.com/monstera.jpg";

fn coordinator(client: &Arc<MockLlmClient>) -> PlantAnalysisCoordinator {
    PlantAnalysisCoordinator::new(client.clone(), "gpt-4o", "gpt-4o-mini")
}

#[tokio::test]
async fn test_all_agents_succeed() {
    let client = Arc::new(MockLlmClient::with_confidences(90, 80, 70, 60));
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;

    assert!(outcome.success);
    let data = outcome.data.expect("synthesized record");
    assert_eq!(data.confidence, 75);
    assert_eq!(data.analysis.overall_confidence, 75);
    assert_eq!(data.analysis.agent_success, 4);
    assert_eq!(data.analysis.total_agents, 4);
    assert_eq!(data.species, "Monstera deliciosa");
    assert_eq!(data.common_name, "Costilla de Adán");
    assert_eq!(data.health.overall_health, HealthStatus::Fair);
    assert_eq!(data.care_profile.watering.frequency, "Cada 6 días");
    assert_eq!(data.personality.mood, "teatral");
    assert_eq!(data.catchphrases.len(), 2);
    assert!(outcome.summary.contains("4/4"));
}

#[tokio::test]
async fn test_species_failure_keeps_health() {
    let client = Arc::new(
        MockLlmClient::with_confidences(90, 80, 70, 60).fail(Caller::Species, 500),
    );
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;

    assert!(outcome.success);
    let data = outcome.data.expect("synthesized record");
    assert_eq!(data.species, "Especie no identificada");
    assert_eq!(data.health.overall_health, HealthStatus::Fair);
    assert_eq!(data.health.health_score, 62);
    assert_eq!(data.health.symptoms, vec!["puntas secas"]);
    // mean of 80, 70, 60
    assert_eq!(data.confidence, 70);
    assert_eq!(data.analysis.agent_success, 3);

    let health_prompt = client.request_for(Caller::Health).unwrap().messages[1]
        .content
        .text();
    assert!(health_prompt.contains("no pudo identificarse"));
}

#[tokio::test]
async fn test_every_agent_fails() {
    let client = Arc::new(MockLlmClient::new());
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;

    assert!(outcome.success);
    assert_eq!(outcome.total_cost, 0);
    let data = outcome.data.expect("synthesized record");
    assert_eq!(data.confidence, 0);
    assert_eq!(data.analysis.agent_success, 0);
    assert_eq!(data.health.health_score, 75);
    assert!(!data.weekly_routine.is_empty());

    let results = outcome.agent_results.expect("agent results");
    assert!(!results.species.success);
    assert!(results.care.reasoning.contains("503"));
}

#[tokio::test]
async fn test_total_cost_sums_all_envelopes() {
    let client = Arc::new(MockLlmClient::with_confidences(90, 80, 70, 60));
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;
    assert_eq!(outcome.total_cost, 250 + 500 + 700 + 380);
    assert_eq!(outcome.ledger.total_tokens(), outcome.total_cost);

    let client = Arc::new(
        MockLlmClient::with_confidences(90, 80, 70, 60).fail(Caller::Health, 429),
    );
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;
    let results = outcome.agent_results.expect("agent results");
    assert_eq!(results.health.cost, 0);
    assert_eq!(
        outcome.total_cost,
        results.species.cost + results.health.cost + results.care.cost + results.personality.cost
    );
    assert_eq!(outcome.total_cost, 250 + 700 + 380);
}

#[tokio::test]
async fn test_call_order() {
    let client = Arc::new(MockLlmClient::with_confidences(90, 80, 70, 60));
    coordinator(&client).analyze_complete(IMAGE, None).await;

    let calls = client.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], Caller::Species);
    assert_eq!(calls[1], Caller::Health);
    assert!(calls[2..].contains(&Caller::Care));
    assert!(calls[2..].contains(&Caller::Personality));
}

#[tokio::test]
async fn test_care_and_personality_run_concurrently() {
    let client = Arc::new(MockLlmClient::with_confidences(90, 80, 70, 60).with_rendezvous());
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        coordinator(&client).analyze_complete(IMAGE, None),
    )
    .await
    .expect("care and personality must be in flight together");

    assert!(outcome.success);
    assert_eq!(outcome.data.unwrap().analysis.agent_success, 4);
}

#[tokio::test]
async fn test_one_parallel_failure_keeps_the_other() {
    let client = Arc::new(
        MockLlmClient::with_confidences(90, 80, 70, 60).fail(Caller::Care, 500),
    );
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;

    let results = outcome.agent_results.expect("agent results");
    assert!(!results.care.success);
    assert!(results.care.data.is_none());
    assert!(results.personality.success);
    assert_eq!(results.personality.confidence, 60);

    let data = outcome.data.expect("synthesized record");
    assert_eq!(data.personality.mood, "teatral");
    assert_eq!(data.confidence, 77);
}

#[tokio::test]
async fn test_context_reaches_care_prompt() {
    let client = Arc::new(MockLlmClient::with_confidences(90, 80, 70, 60));
    let context = AnalysisContext {
        seasonal_context: Some(Season::Verano),
        user_history: vec!["Regada el lunes".into()],
        ..Default::default()
    };
    coordinator(&client)
        .analyze_complete(IMAGE, Some(context))
        .await;

    let care_prompt = client.request_for(Caller::Care).unwrap().messages[1]
        .content
        .text();
    assert!(care_prompt.contains("Estación actual: verano"));
    assert!(care_prompt.contains("Regada el lunes"));
    assert!(care_prompt.contains("Monstera deliciosa"));
}

#[tokio::test]
async fn test_outcome_serializes_camel_case() {
    let client = Arc::new(MockLlmClient::with_confidences(90, 80, 70, 60));
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["totalCost"], 1830);
    assert_eq!(value["data"]["analysis"]["agentSuccess"], 4);
    assert_eq!(value["agentResults"]["species"]["confidence"], 90);
    assert!(value["data"]["analysis"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_fenced_and_lenient_replies() {
    let client = Arc::new(
        MockLlmClient::new()
            .reply(Caller::Species, format!("```json\n{}\n```", species_reply(88)), 200)
            .reply(
                Caller::Health,
                r#"{"overallHealth": "Excelente", "healthScore": "91%", "confidence": null}"#,
                300,
            )
            .reply(Caller::Care, care_reply(70), 700)
            .reply(Caller::Personality, personality_reply(60), 380),
    );
    let outcome = coordinator(&client).analyze_complete(IMAGE, None).await;
    let results = outcome.agent_results.expect("agent results");

    assert!(results.species.success);
    assert_eq!(results.species.confidence, 88);
    assert!(results.health.success);
    // model left confidence null: health fallback
    assert_eq!(results.health.confidence, 70);
    assert_eq!(
        outcome.data.unwrap().health.overall_health,
        HealthStatus::Excellent
    );
}

#[tokio::test]
async fn test_broken_plan_is_total_failure() {
    let client = Arc::new(MockLlmClient::with_confidences(90, 80, 70, 60));
    let plan = PipelinePlan::resolve(&[
        StageSpec::new(Stage::Species, &[]),
        StageSpec::new(Stage::Health, &[Stage::Species]),
    ])
    .unwrap();
    let outcome = coordinator(&client)
        .with_plan(plan)
        .analyze_complete(IMAGE, None)
        .await;

    assert!(!outcome.success);
    assert!(outcome.data.is_none());
    assert_eq!(outcome.total_cost, 0);
    assert!(!outcome.summary.is_empty());
}

#[test]
fn test_standard_plan_shape() {
    let plan = PipelinePlan::standard().unwrap();
    assert_eq!(plan.layers().len(), 3);
    assert_eq!(plan.layers()[2], vec![Stage::Care, Stage::Personality]);
}
