// src/coordinator/pipeline.rs
// Stage graph for the analysis pipeline, resolved into barrier-separated layers

use crate::error::{PlantitasError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One agent invocation in the analysis pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Species,
    Health,
    Care,
    Personality,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Species, Stage::Health, Stage::Care, Stage::Personality];

    /// Stages whose output this stage reads
    pub fn dependencies(&self) -> &'static [Stage] {
        match self {
            Self::Species => &[],
            Self::Health => &[Stage::Species],
            Self::Care | Self::Personality => &[Stage::Species, Stage::Health],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::Health => "health",
            Self::Care => "care",
            Self::Personality => "personality",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage plus the stages it must wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub stage: Stage,
    pub depends_on: Vec<Stage>,
}

impl StageSpec {
    pub fn new(stage: Stage, depends_on: &[Stage]) -> Self {
        Self {
            stage,
            depends_on: depends_on.to_vec(),
        }
    }
}

/// Execution plan: layers run in order, stages inside a layer run concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePlan {
    layers: Vec<Vec<Stage>>,
}

impl PipelinePlan {
    /// The four-stage plan built from `Stage::dependencies`
    pub fn standard() -> Result<Self> {
        let specs: Vec<StageSpec> = Stage::ALL
            .iter()
            .map(|s| StageSpec::new(*s, s.dependencies()))
            .collect();
        Self::resolve(&specs)
    }

    /// Group stages into dependency layers. Rejects duplicate stages,
    /// dependencies on stages not in the plan, and cycles.
    pub fn resolve(specs: &[StageSpec]) -> Result<Self> {
        let mut declared = BTreeSet::new();
        for spec in specs {
            if !declared.insert(spec.stage) {
                return Err(PlantitasError::Pipeline(format!(
                    "stage {} declared twice",
                    spec.stage
                )));
            }
        }
        for spec in specs {
            if let Some(missing) = spec.depends_on.iter().find(|d| !declared.contains(*d)) {
                return Err(PlantitasError::Pipeline(format!(
                    "stage {} depends on {} which is not in the plan",
                    spec.stage, missing
                )));
            }
        }

        let mut done: BTreeSet<Stage> = BTreeSet::new();
        let mut layers = Vec::new();
        while done.len() < specs.len() {
            let mut layer: Vec<Stage> = specs
                .iter()
                .filter(|s| !done.contains(&s.stage))
                .filter(|s| s.depends_on.iter().all(|d| done.contains(d)))
                .map(|s| s.stage)
                .collect();
            if layer.is_empty() {
                let stuck: Vec<&str> = specs
                    .iter()
                    .filter(|s| !done.contains(&s.stage))
                    .map(|s| s.stage.name())
                    .collect();
                return Err(PlantitasError::Pipeline(format!(
                    "dependency cycle among stages: {}",
                    stuck.join(", ")
                )));
            }
            layer.sort();
            done.extend(layer.iter().copied());
            layers.push(layer);
        }

        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Vec<Stage>] {
        &self.layers
    }

    pub fn stage_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Position of the layer containing `stage`
    pub fn layer_of(&self, stage: Stage) -> Option<usize> {
        self.layers.iter().position(|l| l.contains(&stage))
    }
}
