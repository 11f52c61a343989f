// src/main.rs
// Plantitas CLI - analyze a plant photo or chat with an analysed plant

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use plantitas::agents::{AnalysisContext, Season};
use plantitas::chat::{ChatTurn, PlantChatResponder, PlantProfile};
use plantitas::config::EnvConfig;
use plantitas::coordinator::{AnalysisOutcome, PlantAnalysisCoordinator, SynthesizedAnalysis};
use plantitas::llm::{LlmClient, OpenAiClient};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plantitas")]
#[command(about = "Multi-agent plant analysis and plant-persona chat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline on a plant photo and print the outcome as JSON
    Analyze {
        /// Publicly reachable image URL (or data URL)
        image_url: String,

        /// Season override (primavera, verano, otoño, invierno)
        #[arg(short, long, value_parser = parse_season)]
        season: Option<Season>,

        /// JSON file with free-form notes about the plant
        #[arg(long)]
        plant_data: Option<PathBuf>,
    },

    /// Send one message to an analysed plant
    Chat {
        /// Analysis JSON written by `analyze` (outcome or bare record)
        #[arg(short, long)]
        plant: PathBuf,

        /// Name the plant answers to
        #[arg(short, long)]
        name: Option<String>,

        /// JSON array of previous turns: [{"role": "user"|"plant", "content": "..."}]
        #[arg(long)]
        history: Option<PathBuf>,

        message: String,
    },

    /// Validate environment configuration
    CheckConfig,
}

fn parse_season(s: &str) -> std::result::Result<Season, String> {
    Season::parse(s).ok_or_else(|| format!("unknown season '{}'", s))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PLANTITAS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn load_analysis(path: &Path) -> Result<SynthesizedAnalysis> {
    let value: serde_json::Value = read_json(path)?;
    if value.get("success").is_some() {
        let outcome: AnalysisOutcome = serde_json::from_value(value)?;
        return outcome
            .data
            .context("analysis outcome has no data (the analysis failed)");
    }
    Ok(serde_json::from_value(value)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn usable_config() -> Result<EnvConfig> {
    let config = EnvConfig::load();
    let validation = config.validate();
    if !validation.is_valid() {
        bail!("{}", validation.report());
    }
    Ok(config)
}

async fn run_analyze(image_url: String, season: Option<Season>, plant_data: Option<PathBuf>) -> Result<()> {
    let config = usable_config()?;
    info!(vision_model = %config.vision_model, text_model = %config.text_model, "Starting analysis");

    let context = AnalysisContext {
        image_url: Some(image_url.clone()),
        plant_data: plant_data.as_deref().map(read_json::<serde_json::Value>).transpose()?,
        seasonal_context: season,
        ..Default::default()
    };
    let coordinator = PlantAnalysisCoordinator::from_config(&config);
    let outcome = coordinator.analyze_complete(&image_url, Some(context)).await;
    info!(success = outcome.success, tokens = outcome.total_cost, "{}", outcome.summary);
    print_json(&outcome)
}

async fn run_chat(
    plant: PathBuf,
    name: Option<String>,
    history: Option<PathBuf>,
    message: String,
) -> Result<()> {
    let config = usable_config()?;
    let analysis = load_analysis(&plant)?;
    let mut profile = PlantProfile::from(&analysis);
    if let Some(name) = name {
        profile = profile.with_name(name);
    }
    let history: Vec<ChatTurn> = match history {
        Some(path) => read_json(&path)?,
        None => Vec::new(),
    };

    let client: Arc<dyn LlmClient> = Arc::new(OpenAiClient::from_config(&config));
    let responder = PlantChatResponder::new(client, &config.text_model);
    let reply = responder
        .generate_plant_response(&message, &profile, &history)
        .await;
    print_json(&reply)
}

fn run_check_config() -> Result<()> {
    let config = EnvConfig::load();
    let validation = config.validate();
    println!("{}", validation.report());
    if !validation.is_valid() {
        bail!("configuration is not usable");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Analyze {
            image_url,
            season,
            plant_data,
        } => run_analyze(image_url, season, plant_data).await,
        Commands::Chat {
            plant,
            name,
            history,
            message,
        } => run_chat(plant, name, history, message).await,
        Commands::CheckConfig => run_check_config(),
    }
}
