//! Stage 1: pre-validation (§4.4). Drops malformed rows and deduplicates
//! by `(from_lc, type_lc, to_lc)`, keeping the first (highest-priority)
//! occurrence.

use std::collections::HashSet;

use crate::candidate::RelationshipCandidate;

pub fn pre_validate(mut candidates: Vec<RelationshipCandidate>) -> Vec<RelationshipCandidate> {
    candidates.retain(|c| c.is_well_formed());
    for c in &mut candidates {
        c.priority = c.confidence;
    }
    // Highest priority first so the dedup pass below keeps the best row.
    candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.semantic_key()));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ctp_core::types::identifiers::RelationshipId;
    use ctp_core::types::{RelationshipType, SourceMode};

    use crate::candidate::Scope;

    fn candidate(from: &str, to: &str, confidence: f64) -> RelationshipCandidate {
        RelationshipCandidate {
            relationship_id: RelationshipId::generate(),
            from: from.to_string(),
            to: to.to_string(),
            relationship_type: RelationshipType::Calls,
            confidence,
            scope: Scope::File,
            source_mode: SourceMode::Batch,
            observed_at: Utc::now(),
            priority: 0.0,
        }
    }

    #[test]
    fn drops_out_of_range_confidence() {
        let candidates = vec![candidate("a", "b", 1.5), candidate("a", "b", 0.5)];
        let out = pre_validate(candidates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.5);
    }

    #[test]
    fn dedups_by_semantic_key_keeping_highest_priority() {
        let candidates = vec![candidate("A", "B", 0.3), candidate("a", "b", 0.9)];
        let out = pre_validate(candidates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.9);
    }

    #[test]
    fn drops_empty_endpoints() {
        let candidates = vec![candidate("", "b", 0.5)];
        assert!(pre_validate(candidates).is_empty());
    }
}
