//! Stage 4: conflict detection across four dimensions (§4.4). A compound
//! conflict (≥ 2 dimensions on the same pair) gets a 1.2x severity boost.

use ctp_core::types::identifiers::RelationshipId;

use crate::candidate::RelationshipCandidate;
use crate::comparison::entity_similarity;

const SAME_ENTITY_THRESHOLD: f64 = 0.7;
const TEMPORAL_CONFLICT_DAYS: i64 = 7;
const CONFIDENCE_DELTA_THRESHOLD: f64 = 0.25;
const COMPOUND_BOOST: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictDimension {
    Semantic,
    Temporal,
    Scope,
    Confidence,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub dimension: ConflictDimension,
    pub severity: f64,
    pub a: RelationshipId,
    pub b: RelationshipId,
}

fn same_entity_pair(a: &RelationshipCandidate, b: &RelationshipCandidate) -> bool {
    entity_similarity(&a.from, &b.from) >= SAME_ENTITY_THRESHOLD
        && entity_similarity(&a.to, &b.to) >= SAME_ENTITY_THRESHOLD
}

/// Detect all conflicts between one pair of candidates sharing (or
/// near-sharing) the same entity pair, applying the compound-conflict
/// severity boost when ≥ 2 dimensions fire.
pub fn detect_conflicts(a: &RelationshipCandidate, b: &RelationshipCandidate) -> Vec<Conflict> {
    if !same_entity_pair(a, b) {
        return Vec::new();
    }

    let mut found = Vec::new();

    if a.relationship_type != b.relationship_type {
        let type_mismatch = 1.0;
        let evidence_conflict = if (a.confidence - b.confidence).abs() > CONFIDENCE_DELTA_THRESHOLD { 1.0 } else { 0.0 };
        found.push(ConflictDimension::Semantic.score(0.5 + 0.3 * type_mismatch + 0.2 * evidence_conflict));
    }

    let age_days = (a.observed_at - b.observed_at).num_days().abs();
    let disagreement = a.relationship_type != b.relationship_type || (a.confidence - b.confidence).abs() > CONFIDENCE_DELTA_THRESHOLD;
    if age_days > TEMPORAL_CONFLICT_DAYS && disagreement {
        found.push(ConflictDimension::Temporal.score(0.5));
    }

    if a.scope != b.scope {
        found.push(ConflictDimension::Scope.score(0.4));
    }

    if (a.confidence - b.confidence).abs() > CONFIDENCE_DELTA_THRESHOLD {
        found.push(ConflictDimension::Confidence.score((a.confidence - b.confidence).abs()));
    }

    let compound = found.len() >= 2;
    found
        .into_iter()
        .map(|(dimension, severity)| Conflict {
            dimension,
            severity: if compound { (severity * COMPOUND_BOOST).min(1.0) } else { severity },
            a: a.relationship_id.clone(),
            b: b.relationship_id.clone(),
        })
        .collect()
}

impl ConflictDimension {
    fn score(self, severity: f64) -> (ConflictDimension, f64) {
        (self, severity)
    }
}

/// Overall severity across a set of conflicts (§4.4):
/// `max * 0.7 + avg * 0.2 + count_factor * 0.1`, where `count_factor`
/// saturates at 1.0 once five or more conflicts are present.
pub fn overall_severity(conflicts: &[Conflict]) -> f64 {
    if conflicts.is_empty() {
        return 0.0;
    }
    let severities: Vec<f64> = conflicts.iter().map(|c| c.severity).collect();
    let max = severities.iter().cloned().fold(0.0_f64, f64::max);
    let avg = severities.iter().sum::<f64>() / severities.len() as f64;
    let count_factor = (conflicts.len() as f64 / 5.0).min(1.0);
    (max * 0.7 + avg * 0.2 + count_factor * 0.1).clamp(0.0, 1.0)
}

/// ≥ 2 distinct dimensions present means the pair has a compound conflict.
pub fn is_compound(conflicts: &[Conflict]) -> bool {
    conflicts.iter().map(|c| c.dimension).collect::<std::collections::HashSet<_>>().len() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use ctp_core::types::{RelationshipType, SourceMode};

    use crate::candidate::Scope;

    fn candidate(rel_type: RelationshipType, confidence: f64, scope: Scope, days_ago: i64) -> RelationshipCandidate {
        RelationshipCandidate {
            relationship_id: RelationshipId::generate(),
            from: "a".to_string(),
            to: "b".to_string(),
            relationship_type: rel_type,
            confidence,
            scope,
            source_mode: SourceMode::Batch,
            observed_at: Utc::now() - Duration::days(days_ago),
            priority: 0.0,
        }
    }

    #[test]
    fn semantic_conflict_on_type_mismatch() {
        let a = candidate(RelationshipType::Calls, 0.5, Scope::File, 0);
        let b = candidate(RelationshipType::Uses, 0.5, Scope::File, 0);
        let conflicts = detect_conflicts(&a, &b);
        assert!(conflicts.iter().any(|c| c.dimension == ConflictDimension::Semantic));
    }

    #[test]
    fn temporal_conflict_needs_age_and_disagreement() {
        let a = candidate(RelationshipType::Calls, 0.9, Scope::File, 0);
        let b = candidate(RelationshipType::Calls, 0.2, Scope::File, 10);
        let conflicts = detect_conflicts(&a, &b);
        assert!(conflicts.iter().any(|c| c.dimension == ConflictDimension::Temporal));
    }

    #[test]
    fn no_conflicts_for_unrelated_entities() {
        let mut a = candidate(RelationshipType::Calls, 0.5, Scope::File, 0);
        a.from = "zzz".to_string();
        let b = candidate(RelationshipType::Calls, 0.9, Scope::File, 0);
        assert!(detect_conflicts(&a, &b).is_empty());
    }

    #[test]
    fn compound_conflict_gets_severity_boost() {
        let a = candidate(RelationshipType::Calls, 0.9, Scope::File, 0);
        let b = candidate(RelationshipType::Uses, 0.1, Scope::Global, 10);
        let conflicts = detect_conflicts(&a, &b);
        assert!(is_compound(&conflicts));
        assert!(conflicts.iter().all(|c| c.severity <= 1.0));
    }

    #[test]
    fn overall_severity_combines_max_avg_and_count() {
        let conflicts = vec![
            Conflict { dimension: ConflictDimension::Semantic, severity: 0.8, a: RelationshipId::generate(), b: RelationshipId::generate() },
            Conflict { dimension: ConflictDimension::Scope, severity: 0.4, a: RelationshipId::generate(), b: RelationshipId::generate() },
        ];
        let severity = overall_severity(&conflicts);
        assert!(severity > 0.0 && severity <= 1.0);
    }
}
