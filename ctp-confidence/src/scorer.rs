//! Deterministic fast-path confidence scorer (§4.3.1). No I/O, no
//! randomness — the same relationship tuple always scores the same.

use regex::Regex;
use std::sync::LazyLock;

use ctp_core::types::RelationshipType;

static CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)call|invoke").unwrap());
static IMPORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)import|require").unwrap());

/// Qualitative bucket for a score, used by reporting and the escalation
/// threshold comparisons in §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::Medium
        } else if score >= 0.4 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }
}

/// The inputs the scorer needs, independent of how the caller stores a
/// relationship (storage row, in-flight candidate, whatever).
#[derive(Debug, Clone)]
pub struct ScoringInput<'a> {
    pub relationship_type: RelationshipType,
    pub reason: &'a str,
    pub evidence_items: usize,
}

/// Compute a deterministic confidence score (§4.3.1).
pub fn score(input: &ScoringInput<'_>) -> f64 {
    let mut value = 0.5;

    if input.relationship_type == RelationshipType::Calls && CALL_PATTERN.is_match(input.reason) {
        value += 0.3;
    }
    if input.relationship_type == RelationshipType::Imports && IMPORT_PATTERN.is_match(input.reason) {
        value += 0.3;
    }
    if input.reason.len() > 20 {
        value += 0.1;
    }
    if input.evidence_items > 1 {
        value += 0.1;
    }

    value.clamp(0.1, 1.0)
}

/// Score and classify in one call.
pub fn score_with_level(input: &ScoringInput<'_>) -> (f64, ConfidenceLevel) {
    let value = score(input);
    (value, ConfidenceLevel::from_score(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(kind: RelationshipType, reason: &'a str, evidence_items: usize) -> ScoringInput<'a> {
        ScoringInput { relationship_type: kind, reason, evidence_items }
    }

    #[test]
    fn base_score_with_no_bonuses() {
        let got = score(&input(RelationshipType::Uses, "x", 0));
        assert_eq!(got, 0.5);
    }

    #[test]
    fn calls_with_invoke_reason_gets_bonus() {
        let got = score(&input(RelationshipType::Calls, "directly invokes the handler", 0));
        // 0.5 base + 0.3 call-bonus + 0.1 length-bonus (len > 20)
        assert!((got - 0.9).abs() < 1e-9);
    }

    #[test]
    fn imports_with_require_reason_gets_bonus() {
        let got = score(&input(RelationshipType::Imports, "require", 0));
        assert!((got - 0.8).abs() < 1e-9);
    }

    #[test]
    fn multiple_evidence_items_add_bonus() {
        let got = score(&input(RelationshipType::Uses, "x", 5));
        assert!((got - 0.6).abs() < 1e-9);
    }

    #[test]
    fn clamps_to_one() {
        let got = score(&input(
            RelationshipType::Calls,
            "this function explicitly invokes and calls the other one directly",
            5,
        ));
        assert_eq!(got, 1.0);
    }

    #[test]
    fn never_scores_below_point_one() {
        // base is 0.5 and every bonus is additive, so 0.1 is only reachable
        // via the floor clamp — assert the floor holds regardless.
        let got = score(&input(RelationshipType::Contains, "", 0));
        assert!(got >= 0.1);
    }

    #[test]
    fn levels_match_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(0.95), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.65), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.45), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.2), ConfidenceLevel::VeryLow);
    }
}
