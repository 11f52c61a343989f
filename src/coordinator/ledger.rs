// src/coordinator/ledger.rs
// Per-request token accounting across pipeline stages

use super::pipeline::Stage;
use serde::{Deserialize, Serialize};

/// What one stage spent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCost {
    pub stage: Stage,
    pub success: bool,
    pub tokens: u32,
    pub duration_ms: u64,
}

/// Cost entries for one analysis, in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLedger {
    entries: Vec<StageCost>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: Stage, success: bool, tokens: u32, duration_ms: u64) {
        self.entries.push(StageCost {
            stage,
            success,
            tokens,
            duration_ms,
        });
    }

    pub fn entries(&self) -> &[StageCost] {
        &self.entries
    }

    pub fn get(&self, stage: Stage) -> Option<&StageCost> {
        self.entries.iter().find(|e| e.stage == stage)
    }

    /// Tokens over every stage, failed ones included (they report zero)
    pub fn total_tokens(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.tokens))
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.success).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable line for the analysis outcome
    pub fn summary(&self, elapsed_ms: u64) -> String {
        format!(
            "Análisis completado: {}/{} agentes exitosos en {:.1}s, {} tokens",
            self.success_count(),
            self.len(),
            elapsed_ms as f64 / 1000.0,
            self.total_tokens()
        )
    }
}
