//! Per-block confidence scores.

use serde::{Deserialize, Serialize};

/// Where a confidence value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    AiExtraction,
    UserInput,
    ManualCorrection,
    PatternMatch,
}

impl ConfidenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceSource::AiExtraction => "ai_extraction",
            ConfidenceSource::UserInput => "user_input",
            ConfidenceSource::ManualCorrection => "manual_correction",
            ConfidenceSource::PatternMatch => "pattern_match",
        }
    }
}

/// A 0-100 confidence value tagged with its source.
///
/// `value == 0` with source `ai_extraction` marks a block whose extraction
/// failed, which is different from a block that was simply absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub value: u8,
    pub source: ConfidenceSource,
}

impl ConfidenceScore {
    /// Build a score, clamping the value to 100.
    pub fn new(value: u32, source: ConfidenceSource) -> Self {
        Self {
            value: value.min(100) as u8,
            source,
        }
    }

    pub fn ai(value: u32) -> Self {
        Self::new(value, ConfidenceSource::AiExtraction)
    }

    /// The marker for a block the collaborator failed to extract.
    pub fn failed() -> Self {
        Self::ai(0)
    }

    pub fn is_failed(&self) -> bool {
        self.value == 0 && self.source == ConfidenceSource::AiExtraction
    }
}

impl Default for ConfidenceScore {
    fn default() -> Self {
        Self::failed()
    }
}
