//! Integrity gate (§4.5): runs before any graph write. Counts orphaned
//! VALIDATED relationships (I1), invalid confidences (I2), and POIs with
//! empty name/type referenced by VALIDATED rows (I6); attempts one
//! automatic repair; aborts fatally if I1 still fails afterward.

use std::collections::{HashMap, HashSet};

use ctp_core::errors::CtpError;
use ctp_core::traits::PipelineStorage;
use ctp_core::types::{Poi, Relationship, RelationshipStatus};

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IntegrityReport {
    pub orphaned_relationships: usize,
    pub invalid_confidence: usize,
    pub invalid_poi_references: usize,
    pub repaired: usize,
}

impl IntegrityReport {
    pub fn has_violations(&self) -> bool {
        self.orphaned_relationships > 0 || self.invalid_confidence > 0 || self.invalid_poi_references > 0
    }
}

fn find_violations(validated: &[Relationship], pois_by_id: &HashMap<String, &Poi>) -> (Vec<String>, IntegrityReport) {
    let mut violating_ids = Vec::new();
    let mut report = IntegrityReport::default();

    for rel in validated {
        let source = pois_by_id.get(rel.source_poi_id.as_str());
        let target = pois_by_id.get(rel.target_poi_id.as_str());

        let mut violated = false;
        if source.is_none() || target.is_none() {
            report.orphaned_relationships += 1;
            violated = true;
        }
        if !rel.satisfies_i2() {
            report.invalid_confidence += 1;
            violated = true;
        }
        if let (Some(s), Some(t)) = (source, target) {
            if !s.satisfies_i6() || !t.satisfies_i6() {
                report.invalid_poi_references += 1;
                violated = true;
            }
        }

        if violated {
            violating_ids.push(rel.id.as_str().to_string());
        }
    }

    (violating_ids, report)
}

/// Run the gate for one run, repairing once if needed. Returns the
/// pre-repair violation counts; a non-empty `orphaned_relationships`
/// count surviving the repair pass is reported via `Err`.
pub fn run_integrity_gate(storage: &dyn PipelineStorage, run_id: &str) -> Result<IntegrityReport, CtpError> {
    let validated = storage.relationships_by_status(run_id, RelationshipStatus::Validated)?;
    let pois = storage.pois_for_run(run_id)?;
    let pois_by_id: HashMap<String, &Poi> = pois.iter().map(|p| (p.id.as_str().to_string(), p)).collect();

    let (violating_ids, mut report) = find_violations(&validated, &pois_by_id);

    if !violating_ids.is_empty() {
        let to_repair: HashSet<&str> = violating_ids.iter().map(|s| s.as_str()).collect();
        for id in &to_repair {
            storage.set_relationship_status(id, RelationshipStatus::Failed, Some(0.0))?;
            report.repaired += 1;
        }

        let revalidated = storage.relationships_by_status(run_id, RelationshipStatus::Validated)?;
        let (_, post_repair) = find_violations(&revalidated, &pois_by_id);
        if post_repair.orphaned_relationships > 0 {
            return Err(CtpError::Integrity(format!(
                "{} VALIDATED relationships remain orphaned after auto-repair",
                post_repair.orphaned_relationships
            )));
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_core::types::identifiers::{FileId, PoiId, RelationshipId, RunId};
    use ctp_core::types::{PoiType, Run};
    use ctp_storage::SqliteStorage;

    fn poi(run_id: &RunId, semantic_id: &str, name: &str) -> Poi {
        Poi {
            id: PoiId::generate(),
            file_id: FileId::generate(),
            run_id: run_id.clone(),
            semantic_id: semantic_id.to_string(),
            name: name.to_string(),
            poi_type: PoiType::Function,
            start_line: 1,
            end_line: 2,
            description: String::new(),
        }
    }

    #[test]
    fn clean_run_has_no_violations() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.initialize().unwrap();
        let run = Run::start("/repo");
        storage.insert_run(&run).unwrap();

        let a = poi(&run.id, "a", "a");
        let b = poi(&run.id, "b", "b");
        storage.upsert_poi(&a).unwrap();
        storage.upsert_poi(&b).unwrap();

        let rel = Relationship {
            id: RelationshipId::generate(),
            run_id: run.id.clone(),
            source_poi_id: a.id.clone(),
            target_poi_id: b.id.clone(),
            relationship_type: ctp_core::types::RelationshipType::Calls,
            confidence: 0.9,
            status: RelationshipStatus::Validated,
            reason: "x".to_string(),
            evidence_hash: "h".to_string(),
        };
        storage.upsert_relationship(&rel).unwrap();

        let report = run_integrity_gate(&storage, run.id.as_str()).unwrap();
        assert!(!report.has_violations());
    }

    #[test]
    fn orphaned_relationship_is_auto_repaired() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.initialize().unwrap();
        let run = Run::start("/repo");
        storage.insert_run(&run).unwrap();

        let a = poi(&run.id, "a", "a");
        storage.upsert_poi(&a).unwrap();

        let rel = Relationship {
            id: RelationshipId::generate(),
            run_id: run.id.clone(),
            source_poi_id: a.id.clone(),
            target_poi_id: PoiId::generate(), // doesn't exist: orphan
            relationship_type: ctp_core::types::RelationshipType::Calls,
            confidence: 0.9,
            status: RelationshipStatus::Validated,
            reason: "x".to_string(),
            evidence_hash: "h".to_string(),
        };
        storage.upsert_relationship(&rel).unwrap();

        let report = run_integrity_gate(&storage, run.id.as_str()).unwrap();
        assert_eq!(report.orphaned_relationships, 1);
        assert_eq!(report.repaired, 1);

        let repaired = storage.get_relationship(rel.id.as_str()).unwrap().unwrap();
        assert_eq!(repaired.status, RelationshipStatus::Failed);
        assert_eq!(repaired.confidence, 0.0);
    }
}
