//! Combining confidence from different sources.

use buckled_core::{ConfidenceScore, ConfidenceSource};

/// How much each source is trusted when two scores are merged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliabilityTable {
    pub manual_correction: f64,
    pub user_input: f64,
    pub ai_extraction: f64,
    pub pattern_match: f64,
}

impl Default for ReliabilityTable {
    fn default() -> Self {
        Self {
            manual_correction: 1.0,
            user_input: 0.8,
            ai_extraction: 0.7,
            pattern_match: 0.5,
        }
    }
}

impl ReliabilityTable {
    pub fn weight(&self, source: ConfidenceSource) -> f64 {
        match source {
            ConfidenceSource::ManualCorrection => self.manual_correction,
            ConfidenceSource::UserInput => self.user_input,
            ConfidenceSource::AiExtraction => self.ai_extraction,
            ConfidenceSource::PatternMatch => self.pattern_match,
        }
    }
}

/// Reliability-weighted average of two scores. The result is a manual
/// correction if either input was, otherwise an AI extraction.
pub fn merge_confidence(
    existing: ConfidenceScore,
    incoming: ConfidenceScore,
    table: &ReliabilityTable,
) -> ConfidenceScore {
    let we = table.weight(existing.source);
    let wi = table.weight(incoming.source);
    let total = we + wi;
    let value = if total > 0.0 {
        (existing.value as f64 * we + incoming.value as f64 * wi) / total
    } else {
        (existing.value as f64 + incoming.value as f64) / 2.0
    };

    let manual = existing.source == ConfidenceSource::ManualCorrection
        || incoming.source == ConfidenceSource::ManualCorrection;
    let source = if manual {
        ConfidenceSource::ManualCorrection
    } else {
        ConfidenceSource::AiExtraction
    };

    ConfidenceScore::new(value.round() as u32, source)
}

/// Merge one field: an incoming value replaces the current one and the two
/// confidences are merged; without an incoming value nothing changes.
pub fn merge_field<T>(
    current: Option<T>,
    current_confidence: ConfidenceScore,
    incoming: Option<T>,
    incoming_confidence: ConfidenceScore,
    table: &ReliabilityTable,
) -> (Option<T>, ConfidenceScore) {
    match (current, incoming) {
        (current, None) => (current, current_confidence),
        (None, Some(value)) => (Some(value), incoming_confidence),
        (Some(_), Some(value)) => (
            Some(value),
            merge_confidence(current_confidence, incoming_confidence, table),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: u32, source: ConfidenceSource) -> ConfidenceScore {
        ConfidenceScore::new(value, source)
    }

    #[test]
    fn test_weighted_average() {
        let table = ReliabilityTable::default();
        // (80*0.7 + 60*0.8) / 1.5 = 69.33
        let merged = merge_confidence(
            score(80, ConfidenceSource::AiExtraction),
            score(60, ConfidenceSource::UserInput),
            &table,
        );
        assert_eq!(merged.value, 69);
        assert_eq!(merged.source, ConfidenceSource::AiExtraction);
    }

    #[test]
    fn test_manual_wins_source_from_either_side() {
        let table = ReliabilityTable::default();
        let a = merge_confidence(
            score(100, ConfidenceSource::ManualCorrection),
            score(40, ConfidenceSource::PatternMatch),
            &table,
        );
        assert_eq!(a.source, ConfidenceSource::ManualCorrection);
        // (100*1.0 + 40*0.5) / 1.5 = 80
        assert_eq!(a.value, 80);

        let b = merge_confidence(
            score(40, ConfidenceSource::PatternMatch),
            score(100, ConfidenceSource::ManualCorrection),
            &table,
        );
        assert_eq!(b.source, ConfidenceSource::ManualCorrection);
    }

    #[test]
    fn test_merge_field() {
        let table = ReliabilityTable::default();
        let ai = |v| score(v, ConfidenceSource::AiExtraction);

        let (v, c) = merge_field(Some(50_000u32), ai(60), None, ai(90), &table);
        assert_eq!((v, c), (Some(50_000), ai(60)));

        let (v, c) = merge_field(None, ai(0), Some(51_000u32), ai(90), &table);
        assert_eq!((v, c), (Some(51_000), ai(90)));

        let (v, c) = merge_field(Some(50_000u32), ai(60), Some(52_000), ai(90), &table);
        assert_eq!(v, Some(52_000));
        assert_eq!(c.value, 75);
    }
}
