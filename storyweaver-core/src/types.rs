use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTagError {
    #[error("unknown genre: {0}")]
    Genre(String),
    #[error("unsupported translation language: {0}")]
    Language(String),
}

/// Writing style requested for a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Genre {
    #[default]
    General,
    Fantasy,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Mystery,
    Romantic,
    Gothic,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::General,
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Mystery,
        Genre::Romantic,
        Genre::Gothic,
    ];

    // Stable display label; also the persisted form in the story library.
    pub fn label(self) -> &'static str {
        match self {
            Genre::General => "General",
            Genre::Fantasy => "Fantasy",
            Genre::SciFi => "Sci-Fi",
            Genre::Mystery => "Mystery",
            Genre::Romantic => "Romantic",
            Genre::Gothic => "Gothic",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Genre {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_tag(s);
        Genre::ALL
            .into_iter()
            .find(|g| normalize_tag(g.label()) == wanted)
            .ok_or_else(|| ParseTagError::Genre(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLanguage {
    Urdu,
    Arabic,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 2] = [TargetLanguage::Urdu, TargetLanguage::Arabic];

    pub fn label(self) -> &'static str {
        match self {
            TargetLanguage::Urdu => "Urdu",
            TargetLanguage::Arabic => "Arabic",
        }
    }

    pub fn is_rtl(self) -> bool {
        match self {
            TargetLanguage::Urdu | TargetLanguage::Arabic => true,
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetLanguage {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_tag(s);
        TargetLanguage::ALL
            .into_iter()
            .find(|l| normalize_tag(l.label()) == wanted)
            .ok_or_else(|| ParseTagError::Language(s.to_string()))
    }
}

fn normalize_tag(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// What the user asked for. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    idea: String,
    genre: Genre,
}

impl GenerationRequest {
    pub fn new(idea: impl Into<String>, genre: Genre) -> Self {
        Self {
            idea: idea.into(),
            genre,
        }
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }
}
