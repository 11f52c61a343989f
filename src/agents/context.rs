// src/agents/context.rs
// Situational input for agents that need more than the photo

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Northern-hemisphere season label used in care prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Primavera,
    Verano,
    #[serde(rename = "otoño", alias = "otono")]
    Otono,
    Invierno,
}

impl Season {
    /// Season for a calendar month (1-12). Out-of-range months map to winter.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Primavera,
            6..=8 => Self::Verano,
            9..=11 => Self::Otono,
            _ => Self::Invierno,
        }
    }

    pub fn current() -> Self {
        Self::from_month(Local::now().month())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Primavera => "primavera",
            Self::Verano => "verano",
            Self::Otono => "otoño",
            Self::Invierno => "invierno",
        }
    }

    /// Parse a label in Spanish or English
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "primavera" | "spring" => Some(Self::Primavera),
            "verano" | "summer" => Some(Self::Verano),
            "otoño" | "otono" | "autumn" | "fall" => Some(Self::Otono),
            "invierno" | "winter" => Some(Self::Invierno),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional input bundle for one analysis request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisContext {
    pub image_url: Option<String>,
    /// Free-form notes about the plant (nickname, location, pot...)
    pub plant_data: Option<Value>,
    /// Recent care log lines written by the user
    pub user_history: Vec<String>,
    /// Overrides the season computed from the current month
    pub seasonal_context: Option<Season>,
}

impl AnalysisContext {
    pub fn season(&self) -> Season {
        self.seasonal_context.unwrap_or_else(Season::current)
    }

    /// Extra lines for the care prompt; empty when nothing was supplied
    pub(crate) fn care_notes(&self) -> String {
        let mut lines = Vec::new();
        if let Some(data) = self.plant_data.as_ref().filter(|d| !is_empty_value(d)) {
            lines.push(format!("Datos del usuario sobre la planta: {}", data));
        }
        if !self.user_history.is_empty() {
            let recent: Vec<&str> = self
                .user_history
                .iter()
                .rev()
                .take(5)
                .rev()
                .map(String::as_str)
                .collect();
            lines.push(format!("Historial reciente de cuidados: {}", recent.join("; ")));
        }
        lines.join("\n")
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
