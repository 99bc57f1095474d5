//! Core record and taxonomy types shared by both pipelines.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Coarse genre bucket, closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroGenre {
    Rock,
    Electronic,
    HipHop,
    Pop,
    Reggae,
    Metal,
    Other,
}

impl MacroGenre {
    pub fn as_str(&self) -> &'static str {
        match self {
            MacroGenre::Rock => "rock",
            MacroGenre::Electronic => "electronic",
            MacroGenre::HipHop => "hip_hop",
            MacroGenre::Pop => "pop",
            MacroGenre::Reggae => "reggae",
            MacroGenre::Metal => "metal",
            MacroGenre::Other => "other",
        }
    }
}

impl FromStr for MacroGenre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rock" => Ok(MacroGenre::Rock),
            "electronic" => Ok(MacroGenre::Electronic),
            "hip_hop" => Ok(MacroGenre::HipHop),
            "pop" => Ok(MacroGenre::Pop),
            "reggae" => Ok(MacroGenre::Reggae),
            "metal" => Ok(MacroGenre::Metal),
            "other" => Ok(MacroGenre::Other),
            other => Err(format!("unknown macro_genre '{other}'")),
        }
    }
}

impl fmt::Display for MacroGenre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Energy level, closed enum. Ordinal order matters for the heatmap encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EnergyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
            EnergyLevel::VeryHigh => "very_high",
        }
    }

    /// Ordinal scale used by the heatmap energy mode.
    pub fn ordinal(&self) -> u8 {
        match self {
            EnergyLevel::Low => 0,
            EnergyLevel::Medium => 1,
            EnergyLevel::High => 2,
            EnergyLevel::VeryHigh => 3,
        }
    }
}

impl FromStr for EnergyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(EnergyLevel::Low),
            "medium" => Ok(EnergyLevel::Medium),
            "high" => Ok(EnergyLevel::High),
            "very_high" => Ok(EnergyLevel::VeryHigh),
            other => Err(format!("unknown energy_level '{other}'")),
        }
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mood tag, closed enum. A listen carries zero to three of these.
///
/// Declaration order doubles as the fixed heatmap palette order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Calm,
    Happy,
    Aggressive,
    Melancholic,
    Psychedelic,
    Energetic,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Calm => "calm",
            Mood::Happy => "happy",
            Mood::Aggressive => "aggressive",
            Mood::Melancholic => "melancholic",
            Mood::Psychedelic => "psychedelic",
            Mood::Energetic => "energetic",
        }
    }

    /// Fixed categorical palette index for the heatmap mood mode.
    pub fn palette_index(&self) -> u8 {
        *self as u8
    }

    /// Parses the comma-separated mood column into a list of tags.
    ///
    /// An empty or whitespace-only field is a valid empty list.
    pub fn parse_list(raw: &str) -> Result<Vec<Mood>, String> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Mood::from_str)
            .collect()
    }

    /// Joins moods back into the comma-separated CSV form.
    pub fn join_list(moods: &[Mood]) -> String {
        moods
            .iter()
            .map(Mood::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "calm" => Ok(Mood::Calm),
            // legacy label from an earlier tagging pass
            "chill" => Ok(Mood::Calm),
            "happy" => Ok(Mood::Happy),
            "aggressive" => Ok(Mood::Aggressive),
            "melancholic" => Ok(Mood::Melancholic),
            "psychedelic" => Ok(Mood::Psychedelic),
            "energetic" => Ok(Mood::Energetic),
            other => Err(format!("unknown mood '{other}'")),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One play event from the enriched listening log.
///
/// `played_at` is timezone-naive local time; the loader strips any offset
/// annotation found in the source instead of converting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListenEvent {
    pub played_at: NaiveDateTime,
    pub artist: String,
    pub album: String,
    pub track: String,
    pub macro_genre: MacroGenre,
    pub energy_level: EnergyLevel,
    pub moods: Vec<Mood>,
}
