//! Stage 5: conflict resolution (§4.4). One of five strategies is chosen
//! by rule, then applied to pick a winner among conflicting candidates.

use ctp_core::types::identifiers::RelationshipId;

use crate::candidate::RelationshipCandidate;
use crate::comparison::pairwise_similarity;
use crate::conflict::{is_compound, Conflict, ConflictDimension};
use crate::evidence::{collect_evidence, evidence_strength};

use super::history::{HistoricalCase, LearningHistory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    Consensus,
    EvidenceBased,
    RecencyWeighted,
    MachineLearning,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub selected: RelationshipId,
    pub rejected: Vec<RelationshipId>,
    pub confidence: f64,
    pub strategy: ResolutionStrategy,
    pub reasoning: String,
}

/// Pick the strategy per the §4.4 rule order: compound or > 3 conflicts
/// forces consensus; a semantic conflict forces evidence-based; a
/// temporal conflict forces recency-weighted; otherwise evidence-based,
/// with a machine-learning fallback once enough similar history exists.
fn choose_strategy(conflicts: &[Conflict], history: &LearningHistory, features: &[f64; 3]) -> ResolutionStrategy {
    if is_compound(conflicts) || conflicts.len() > 3 {
        return ResolutionStrategy::Consensus;
    }
    if conflicts.iter().any(|c| c.dimension == ConflictDimension::Semantic) {
        return ResolutionStrategy::EvidenceBased;
    }
    if conflicts.iter().any(|c| c.dimension == ConflictDimension::Temporal) {
        return ResolutionStrategy::RecencyWeighted;
    }
    if history.has_sufficient_similar_cases(features) {
        ResolutionStrategy::MachineLearning
    } else {
        ResolutionStrategy::EvidenceBased
    }
}

fn consensus(candidates: &[RelationshipCandidate]) -> (usize, String) {
    use std::collections::HashMap;
    let mut groups: HashMap<(String, bool), Vec<usize>> = HashMap::new();
    for (i, c) in candidates.iter().enumerate() {
        groups.entry((format!("{:?}", c.relationship_type), matches!(c.scope, crate::candidate::Scope::File))).or_default().push(i);
    }
    let (winner_group, _) = groups
        .iter()
        .map(|(key, idxs)| {
            let total_confidence: f64 = idxs.iter().map(|&i| candidates[i].confidence).sum();
            let score = total_confidence * (idxs.len() as f64).sqrt();
            (key.clone(), score)
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap();
    let idxs = &groups[&winner_group];
    let best = *idxs.iter().max_by(|&&a, &&b| candidates[a].confidence.partial_cmp(&candidates[b].confidence).unwrap()).unwrap();
    (best, format!("consensus group (type, scope) with {} agreeing rows", idxs.len()))
}

fn evidence_based(
    candidates: &[RelationshipCandidate],
    descriptions: &std::collections::HashMap<String, String>,
) -> (usize, String) {
    let mut best_idx = 0;
    let mut best_strength = f64::MIN;
    for (i, c) in candidates.iter().enumerate() {
        let others: Vec<RelationshipCandidate> = candidates.iter().filter(|o| o.relationship_id != c.relationship_id).cloned().collect();
        let strength = evidence_strength(&collect_evidence(c, descriptions, &others));
        if strength > best_strength {
            best_strength = strength;
            best_idx = i;
        }
    }
    (best_idx, "strongest aggregate evidence wins".to_string())
}

fn recency_weighted(candidates: &[RelationshipCandidate]) -> (usize, String) {
    let now = chrono::Utc::now();
    let best_idx = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let age_days = (now - c.observed_at).num_seconds() as f64 / 86_400.0;
            let score = (-age_days / 7.0).exp() * c.confidence;
            (i, score)
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap();
    (best_idx, "most recent, confidence-weighted row wins".to_string())
}

/// Resolve a conflicting group of candidates into a single winner.
/// `features` is the `[type_match, from_sim, to_sim]` vector used both to
/// gate and to record against the machine-learning history.
pub fn resolve(
    candidates: &[RelationshipCandidate],
    conflicts: &[Conflict],
    descriptions: &std::collections::HashMap<String, String>,
    history: &mut LearningHistory,
) -> Resolution {
    debug_assert!(!candidates.is_empty());
    let features = if candidates.len() >= 2 {
        [
            if candidates[0].relationship_type == candidates[1].relationship_type { 1.0 } else { 0.0 },
            pairwise_similarity(&candidates[0], &candidates[1]),
            pairwise_similarity(&candidates[1], &candidates[0]),
        ]
    } else {
        [1.0, 1.0, 1.0]
    };

    let strategy = choose_strategy(conflicts, history, &features);
    let (winner_idx, reasoning) = match strategy {
        ResolutionStrategy::Consensus => consensus(candidates),
        ResolutionStrategy::EvidenceBased => evidence_based(candidates, descriptions),
        ResolutionStrategy::RecencyWeighted => recency_weighted(candidates),
        // No bespoke model is consumed (§9 open question); fall back to the
        // evidence-based score while still recording under the ML label so
        // the history accumulates real feature/outcome pairs.
        ResolutionStrategy::MachineLearning => evidence_based(candidates, descriptions),
    };

    let selected = candidates[winner_idx].relationship_id.clone();
    let rejected: Vec<RelationshipId> =
        candidates.iter().enumerate().filter(|(i, _)| *i != winner_idx).map(|(_, c)| c.relationship_id.clone()).collect();

    history.record(HistoricalCase { features, selected: selected.clone(), strategy });

    Resolution { selected, rejected, confidence: candidates[winner_idx].confidence, strategy, reasoning }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ctp_core::types::identifiers::RelationshipId;
    use ctp_core::types::{RelationshipType, SourceMode};

    use crate::candidate::Scope;

    fn candidate(confidence: f64, rel_type: RelationshipType) -> RelationshipCandidate {
        RelationshipCandidate {
            relationship_id: RelationshipId::generate(),
            from: "a".to_string(),
            to: "b".to_string(),
            relationship_type: rel_type,
            confidence,
            scope: Scope::File,
            source_mode: SourceMode::Batch,
            observed_at: Utc::now(),
            priority: confidence,
        }
    }

    #[test]
    fn semantic_conflict_forces_evidence_based() {
        let a = candidate(0.8, RelationshipType::Calls);
        let b = candidate(0.3, RelationshipType::Uses);
        let conflicts = vec![Conflict { dimension: ConflictDimension::Semantic, severity: 0.9, a: a.relationship_id.clone(), b: b.relationship_id.clone() }];
        let mut history = LearningHistory::new();
        let resolution = resolve(&[a.clone(), b.clone()], &conflicts, &std::collections::HashMap::new(), &mut history);
        assert_eq!(resolution.strategy, ResolutionStrategy::EvidenceBased);
        assert_eq!(resolution.selected, a.relationship_id);
    }

    #[test]
    fn compound_conflict_forces_consensus() {
        let a = candidate(0.9, RelationshipType::Calls);
        let b = candidate(0.9, RelationshipType::Calls);
        let c = candidate(0.2, RelationshipType::Uses);
        let conflicts = vec![
            Conflict { dimension: ConflictDimension::Semantic, severity: 0.9, a: a.relationship_id.clone(), b: c.relationship_id.clone() },
            Conflict { dimension: ConflictDimension::Scope, severity: 0.4, a: a.relationship_id.clone(), b: c.relationship_id.clone() },
        ];
        let mut history = LearningHistory::new();
        let resolution = resolve(&[a, b, c], &conflicts, &std::collections::HashMap::new(), &mut history);
        assert_eq!(resolution.strategy, ResolutionStrategy::Consensus);
    }

    #[test]
    fn resolution_is_recorded_into_history() {
        let a = candidate(0.8, RelationshipType::Calls);
        let b = candidate(0.3, RelationshipType::Calls);
        let mut history = LearningHistory::new();
        assert_eq!(history.len(), 0);
        let _ = resolve(&[a, b], &[], &std::collections::HashMap::new(), &mut history);
        assert_eq!(history.len(), 1);
    }
}
