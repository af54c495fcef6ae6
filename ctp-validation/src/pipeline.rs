//! Ties the five validation stages together (§4.4): pre-validation,
//! evidence collection, cross-mode comparison, conflict detection, and
//! resolution, ending in a final ACCEPT/REJECT/ESCALATE decision.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::cache::{CachedDecision, ValidationCache};
use crate::candidate::RelationshipCandidate;
use crate::comparison::group_by_semantic_key;
use crate::conflict::{detect_conflicts, overall_severity, Conflict};
use crate::decision::{decide, Decision};
use crate::pre_validation::pre_validate;
use crate::resolution::{resolve, LearningHistory, Resolution};

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub semantic_key: String,
    pub decision: Decision,
    pub confidence: f64,
    pub conflicts: Vec<Conflict>,
    pub resolution: Option<Resolution>,
    pub from_cache: bool,
}

pub struct ValidationPipeline {
    cache: ValidationCache,
    history: Mutex<LearningHistory>,
    escalation_threshold: f64,
}

impl ValidationPipeline {
    pub fn new(escalation_threshold: f64) -> Self {
        Self { cache: ValidationCache::new(), history: Mutex::new(LearningHistory::new()), escalation_threshold }
    }

    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn validate(
        &self,
        raw_candidates: Vec<RelationshipCandidate>,
        descriptions: &HashMap<String, String>,
    ) -> Vec<ValidationOutcome> {
        let candidates = pre_validate(raw_candidates);
        let groups = group_by_semantic_key(candidates);

        groups
            .into_values()
            .map(|group| self.validate_group(group, descriptions))
            .collect()
    }

    fn validate_group(&self, group: Vec<RelationshipCandidate>, descriptions: &HashMap<String, String>) -> ValidationOutcome {
        let semantic_key = group[0].semantic_key();

        if let Some(cached) = self.cache.get(&semantic_key) {
            return ValidationOutcome {
                semantic_key,
                decision: cached.decision,
                confidence: cached.confidence,
                conflicts: Vec::new(),
                resolution: None,
                from_cache: true,
            };
        }

        let mut conflicts = Vec::new();
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                conflicts.extend(detect_conflicts(&group[i], &group[j]));
            }
        }

        let (confidence, resolution) = if group.len() > 1 {
            let mut history = self.history.lock().unwrap();
            let resolution = resolve(&group, &conflicts, descriptions, &mut history);
            (resolution.confidence, Some(resolution))
        } else {
            (group[0].confidence, None)
        };

        let severity = overall_severity(&conflicts);
        let severe = severity >= self.escalation_threshold;
        let decision = decide(confidence, severe);

        self.cache.insert(semantic_key.clone(), CachedDecision { decision, confidence });

        ValidationOutcome { semantic_key, decision, confidence, conflicts, resolution, from_cache: false }
    }
}
