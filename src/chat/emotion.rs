// src/chat/emotion.rs
// Marker-based emotion tagging for plant replies

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Alegre,
    Triste,
    Emocionado,
    Preocupado,
    #[default]
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alegre => "alegre",
            Self::Triste => "triste",
            Self::Emocionado => "emocionado",
            Self::Preocupado => "preocupado",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked top to bottom; first hit wins. Word markers match at the start of
// a word, so "content" hits "contenta" but not "descontenta".
const MARKERS: [(Emotion, &[&str]); 4] = [
    (Emotion::Alegre, &["😊", "😄", "🌞", "feliz", "alegre", "content"]),
    (Emotion::Triste, &["😢", "😔", "triste", "tristeza"]),
    (Emotion::Emocionado, &["🎉", "🤩", "emocionad", "increíble"]),
    (Emotion::Preocupado, &["😟", "😰", "preocupad", "nerviosa", "nervioso"]),
];

/// Tag a reply with the first emotion whose marker appears in it
pub fn detect_emotion(text: &str) -> Emotion {
    let lower = text.to_lowercase();
    MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| contains_marker(&lower, m)))
        .map(|(emotion, _)| *emotion)
        .unwrap_or_default()
}

fn contains_marker(text: &str, marker: &str) -> bool {
    if !marker.starts_with(char::is_alphabetic) {
        return text.contains(marker);
    }
    text.match_indices(marker).any(|(i, _)| {
        !text[..i]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric)
    })
}
