//! Strength and confidence scoring for detected candidates.
//!
//! Strength is a per-document property (indicator words anywhere in the combined
//! text). Confidence is a per-rule property: longer rule sources encode more
//! constraints and map to a higher score.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::detector::Candidate;
use super::patterns::{HIGH_STRENGTH_INDICATORS, LOW_STRENGTH_INDICATORS};

/// Characters of context kept on each side of a match.
pub const EXCERPT_CONTEXT_CHARS: usize = 100;

/// Coarse severity label. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    Low,
    Medium,
    High,
}

impl StrengthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLevel::Low => "low",
            StrengthLevel::Medium => "medium",
            StrengthLevel::High => "high",
        }
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrengthLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(StrengthLevel::Low),
            "medium" => Ok(StrengthLevel::Medium),
            "high" => Ok(StrengthLevel::High),
            other => Err(format!("unknown strength level: {other}")),
        }
    }
}

/// Classify a whole search text. High indicators take precedence over low ones.
pub fn classify_strength(text: &str) -> StrengthLevel {
    let lower = text.to_lowercase();
    if HIGH_STRENGTH_INDICATORS.iter().any(|w| lower.contains(w)) {
        StrengthLevel::High
    } else if LOW_STRENGTH_INDICATORS.iter().any(|w| lower.contains(w)) {
        StrengthLevel::Low
    } else {
        StrengthLevel::Medium
    }
}

/// Confidence from the length of a rule's source text.
pub fn confidence_for_source(source: &str) -> f64 {
    let len = source.chars().count();
    if len > 50 {
        0.9
    } else if len > 30 {
        0.75
    } else {
        0.6
    }
}

/// Context window around a candidate's match, trimmed of surrounding whitespace.
pub fn source_excerpt(text: &str, candidate: &Candidate) -> String {
    let start = text[..candidate.byte_start]
        .char_indices()
        .rev()
        .nth(EXCERPT_CONTEXT_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = text[candidate.byte_end..]
        .char_indices()
        .nth(EXCERPT_CONTEXT_CHARS)
        .map(|(i, _)| candidate.byte_end + i)
        .unwrap_or(text.len());
    text[start..end].trim().to_string()
}
