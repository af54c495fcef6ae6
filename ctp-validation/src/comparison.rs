//! Stage 3: cross-mode comparison (§4.4). Groups relationships that share
//! a semantic key across batch/individual/triangulated modes and checks
//! whether the modes agree.

use std::collections::HashMap;

use crate::candidate::RelationshipCandidate;

/// Entity similarity: 1.0 if equal, 0.7 if one contains the other, 0.5 if
/// they share an underscore/dot-delimited token, else 0.0.
pub fn entity_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.7;
    }
    let tokens = |s: &str| -> std::collections::HashSet<String> {
        s.split(['_', '.']).map(|t| t.to_string()).filter(|t| !t.is_empty()).collect()
    };
    if !tokens(&a).is_disjoint(&tokens(&b)) {
        return 0.5;
    }
    0.0
}

/// Pairwise similarity between two candidates (§4.4):
/// `0.3 * type_match + 0.35 * from_similar + 0.35 * to_similar`.
pub fn pairwise_similarity(a: &RelationshipCandidate, b: &RelationshipCandidate) -> f64 {
    let type_match = if a.relationship_type == b.relationship_type { 1.0 } else { 0.0 };
    let from_sim = entity_similarity(&a.from, &b.from);
    let to_sim = entity_similarity(&a.to, &b.to);
    0.3 * type_match + 0.35 * from_sim + 0.35 * to_sim
}

pub fn group_by_semantic_key(candidates: Vec<RelationshipCandidate>) -> HashMap<String, Vec<RelationshipCandidate>> {
    let mut groups: HashMap<String, Vec<RelationshipCandidate>> = HashMap::new();
    for candidate in candidates {
        groups.entry(candidate.semantic_key()).or_default().push(candidate);
    }
    groups
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// A group's modes "agree" when the variance of their confidences is
/// below 0.15 (§4.4).
pub fn modes_agree(group: &[RelationshipCandidate]) -> bool {
    let confidences: Vec<f64> = group.iter().map(|c| c.confidence).collect();
    variance(&confidences) < 0.15
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ctp_core::types::identifiers::RelationshipId;
    use ctp_core::types::{RelationshipType, SourceMode};

    use crate::candidate::Scope;

    fn candidate(from: &str, to: &str, confidence: f64, mode: SourceMode) -> RelationshipCandidate {
        RelationshipCandidate {
            relationship_id: RelationshipId::generate(),
            from: from.to_string(),
            to: to.to_string(),
            relationship_type: RelationshipType::Calls,
            confidence,
            scope: Scope::File,
            source_mode: mode,
            observed_at: Utc::now(),
            priority: 0.0,
        }
    }

    #[test]
    fn entity_similarity_levels() {
        assert_eq!(entity_similarity("foo", "foo"), 1.0);
        assert_eq!(entity_similarity("foo_bar", "foo"), 0.7);
        assert_eq!(entity_similarity("user_service", "user_repo"), 0.5);
        assert_eq!(entity_similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn pairwise_similarity_full_match() {
        let a = candidate("a", "b", 0.5, SourceMode::Batch);
        let b = candidate("a", "b", 0.5, SourceMode::Individual);
        assert_eq!(pairwise_similarity(&a, &b), 1.0);
    }

    #[test]
    fn modes_agree_under_low_variance() {
        let group = vec![
            candidate("a", "b", 0.7, SourceMode::Batch),
            candidate("a", "b", 0.72, SourceMode::Individual),
        ];
        assert!(modes_agree(&group));
    }

    #[test]
    fn modes_disagree_under_high_variance() {
        let group = vec![
            candidate("a", "b", 0.9, SourceMode::Batch),
            candidate("a", "b", 0.1, SourceMode::Individual),
        ];
        assert!(!modes_agree(&group));
    }
}
