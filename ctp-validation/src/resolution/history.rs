//! Bounded learning history (§4.4): up to 1000 past resolutions, consulted
//! by the `machine_learning` fallback strategy.

use std::collections::VecDeque;

use ctp_core::types::identifiers::RelationshipId;

use super::strategies::ResolutionStrategy;

pub const MAX_HISTORY: usize = 1000;
const SIMILARITY_THRESHOLD: f64 = 0.7;
const MIN_HISTORICAL_CASES: usize = 10;

#[derive(Debug, Clone)]
pub struct HistoricalCase {
    /// A coarse feature vector identifying the kind of conflict resolved:
    /// `[type_match, from_sim, to_sim]`, reused from the comparison stage.
    pub features: [f64; 3],
    pub selected: RelationshipId,
    pub strategy: ResolutionStrategy,
}

#[derive(Default)]
pub struct LearningHistory {
    cases: VecDeque<HistoricalCase>,
}

impl LearningHistory {
    pub fn new() -> Self {
        Self { cases: VecDeque::new() }
    }

    pub fn record(&mut self, case: HistoricalCase) {
        if self.cases.len() >= MAX_HISTORY {
            self.cases.pop_front();
        }
        self.cases.push_back(case);
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    fn feature_similarity(a: &[f64; 3], b: &[f64; 3]) -> f64 {
        let distance: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt();
        (1.0 - distance / (3.0_f64).sqrt()).max(0.0)
    }

    /// Whether the `machine_learning` fallback is eligible: at least 10
    /// historical cases similar to `features` by feature similarity >= 0.7.
    pub fn has_sufficient_similar_cases(&self, features: &[f64; 3]) -> bool {
        self.cases.iter().filter(|c| Self::feature_similarity(&c.features, features) >= SIMILARITY_THRESHOLD).count()
            >= MIN_HISTORICAL_CASES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_history_drops_oldest() {
        let mut history = LearningHistory::new();
        for _ in 0..(MAX_HISTORY + 10) {
            history.record(HistoricalCase {
                features: [1.0, 1.0, 1.0],
                selected: RelationshipId::generate(),
                strategy: ResolutionStrategy::EvidenceBased,
            });
        }
        assert_eq!(history.len(), MAX_HISTORY);
    }

    #[test]
    fn insufficient_cases_below_threshold() {
        let mut history = LearningHistory::new();
        for _ in 0..5 {
            history.record(HistoricalCase {
                features: [1.0, 1.0, 1.0],
                selected: RelationshipId::generate(),
                strategy: ResolutionStrategy::EvidenceBased,
            });
        }
        assert!(!history.has_sufficient_similar_cases(&[1.0, 1.0, 1.0]));
    }

    #[test]
    fn sufficient_similar_cases_enables_ml_fallback() {
        let mut history = LearningHistory::new();
        for _ in 0..10 {
            history.record(HistoricalCase {
                features: [1.0, 1.0, 1.0],
                selected: RelationshipId::generate(),
                strategy: ResolutionStrategy::EvidenceBased,
            });
        }
        assert!(history.has_sufficient_similar_cases(&[1.0, 1.0, 1.0]));
    }
}
