// src/lib.rs
// Plantitas - multi-agent plant analysis over a hosted vision/text model

pub mod agents;
pub mod chat;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod llm;

pub use agents::{AgentResponse, AnalysisContext, Season};
pub use chat::{ChatReply, ChatRole, ChatTurn, Emotion, PlantChatResponder, PlantProfile};
pub use config::EnvConfig;
pub use coordinator::{AnalysisOutcome, PlantAnalysisCoordinator, SynthesizedAnalysis};
pub use error::{PlantitasError, Result};
pub use llm::{LlmClient, OpenAiClient};
