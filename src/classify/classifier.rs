//! Per-artist classification with bounded retries and a deterministic
//! fallback.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::provider::{ChatModel, ModelError};
use crate::events::{EnergyLevel, MacroGenre, Mood};

/// Total attempts per artist before falling back.
pub const MAX_ATTEMPTS: u32 = 3;

const SYSTEM_PROMPT: &str = "\
You are a music classification system.
Your task is to classify musical artists based on their overall musical style.
You must strictly follow the provided schema and allowed values.
Do not add explanations or extra text.
Always return valid JSON.";

fn user_prompt(artist: &str) -> String {
    format!(
        r#"Classify the following musical artist according to the schema below.

Artist name: "{artist}"

Schema:
{{
  "macro_genre": "rock | electronic | hip_hop | pop | reggae | metal | other",
  "sub_genre": "string (max 3 words)",
  "energy_level": "low | medium | high | very_high",
  "mood": ["calm | happy | aggressive | melancholic | psychedelic | energetic"]
}}

Rules:
- Choose ONE macro_genre.
- Choose ONE energy_level.
- Choose 1 to 3 moods.
- Do not include explanations.
- Do not include any text outside the JSON."#
    )
}

/// Taxonomy labels for one artist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistClassification {
    pub artist: String,
    pub macro_genre: MacroGenre,
    pub sub_genre: String,
    pub energy_level: EnergyLevel,
    pub moods: Vec<Mood>,
}

impl ArtistClassification {
    /// Placeholder record used when every attempt failed. Deterministic so
    /// reruns and tests see the exact same row.
    pub fn fallback(artist: &str) -> Self {
        ArtistClassification {
            artist: artist.to_string(),
            macro_genre: MacroGenre::Other,
            sub_genre: "unknown".to_string(),
            energy_level: EnergyLevel::Medium,
            moods: Vec::new(),
        }
    }
}

/// Strict shape of the model reply. Closed enums are enforced by serde;
/// a missing field or an out-of-vocabulary value fails the attempt.
#[derive(Debug, Deserialize)]
struct RawLabel {
    macro_genre: MacroGenre,
    sub_genre: String,
    energy_level: EnergyLevel,
    mood: Vec<Mood>,
}

pub struct Classifier<M> {
    model: M,
}

impl<M: ChatModel> Classifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Classifies one artist. Never fails: after [`MAX_ATTEMPTS`] failed
    /// calls the deterministic fallback record is returned instead, with
    /// linearly increasing backoff between attempts.
    pub async fn classify(&self, artist: &str) -> ArtistClassification {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(artist).await {
                Ok(label) => return label,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!(artist, attempt, error = %e, "Classification attempt failed, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(e) => {
                    error!(artist, error = %e, "Classification failed, using fallback record");
                    return ArtistClassification::fallback(artist);
                }
            }
        }
    }

    async fn attempt(&self, artist: &str) -> Result<ArtistClassification, ModelError> {
        let reply = self
            .model
            .complete(SYSTEM_PROMPT, &user_prompt(artist))
            .await?;
        parse_reply(artist, &reply)
    }
}

/// 1.5 s after the first failure, 3.0 s after the second.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs_f64(1.5 * attempt as f64)
}

fn parse_reply(artist: &str, reply: &str) -> Result<ArtistClassification, ModelError> {
    let raw: RawLabel = serde_json::from_str(extract_json(reply))
        .map_err(|e| ModelError::Parse(e.to_string()))?;

    if raw.mood.is_empty() || raw.mood.len() > 3 {
        return Err(ModelError::Parse(format!(
            "expected 1 to 3 moods, got {}",
            raw.mood.len()
        )));
    }

    Ok(ArtistClassification {
        artist: artist.to_string(),
        macro_genre: raw.macro_genre,
        sub_genre: raw.sub_genre,
        energy_level: raw.energy_level,
        moods: raw.mood,
    })
}

/// Extracts the JSON document from a model reply, tolerating markdown code
/// fences. Models wrap replies in fences often enough that treating the
/// fence as a failure would waste retries.
fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();

    if let Some(start) = trimmed.find("```") {
        let after_tick = &trimmed[start + 3..];
        // skip a language identifier on the opening fence line
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            return &trimmed[start..=end];
        }
    }

    trimmed
}
