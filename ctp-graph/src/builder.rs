//! Bulk graph builder (§4.5): streams VALIDATED relationships in batches of
//! 10,000, each row producing two node upserts (MERGE on `semantic_id`) and
//! one edge upsert keyed by `(source_semantic_id, type, target_semantic_id)`.

use std::collections::HashMap;

use ctp_core::traits::{GraphResult, GraphUpsertBatch, GraphUpsertOutcome, PipelineStorage, PropertyGraph};
use ctp_core::types::{Poi, RelationshipStatus};
use tracing::{info, warn};

pub const BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BuildReport {
    pub batches: usize,
    pub nodes_upserted: usize,
    pub edges_upserted: usize,
    pub edges_skipped_orphan: usize,
}

impl BuildReport {
    fn add(&mut self, batch: &GraphUpsertOutcome) {
        self.batches += 1;
        self.nodes_upserted += batch.nodes_upserted;
        self.edges_upserted += batch.edges_upserted;
        self.edges_skipped_orphan += batch.edges_skipped_orphan;
    }
}

/// Bulk-load every VALIDATED relationship for `run_id` into `graph`,
/// creating indexes first. Idempotent: re-running over the same run
/// re-applies the same upserts.
pub fn build_graph(storage: &dyn PipelineStorage, graph: &dyn PropertyGraph, run_id: &str) -> GraphResult<BuildReport> {
    graph.ensure_indexes()?;

    let relationships = storage.relationships_by_status(run_id, RelationshipStatus::Validated)?;
    let pois = storage.pois_for_run(run_id)?;
    let pois_by_id: HashMap<String, &Poi> = pois.iter().map(|p| (p.id.as_str().to_string(), p)).collect();

    let mut report = BuildReport::default();

    for chunk in relationships.chunks(BATCH_SIZE) {
        let mut batch_pois = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for rel in chunk {
            for poi_id in [rel.source_poi_id.as_str(), rel.target_poi_id.as_str()] {
                if seen.insert(poi_id.to_string()) {
                    if let Some(poi) = pois_by_id.get(poi_id) {
                        batch_pois.push((*poi).clone());
                    }
                }
            }
        }

        let batch = GraphUpsertBatch { pois: batch_pois, relationships: chunk.to_vec() };
        let outcome = graph.upsert_batch(&batch)?;
        if outcome.edges_skipped_orphan > 0 {
            warn!(skipped = outcome.edges_skipped_orphan, "graph batch skipped orphan edges");
        }
        report.add(&outcome);
    }

    let orphans = graph.find_orphan_edges()?;
    if !orphans.is_empty() {
        return Err(ctp_core::errors::CtpError::Integrity(format!(
            "{} orphan edges present in graph after bulk load",
            orphans.len()
        )));
    }

    info!(
        batches = report.batches,
        nodes = report.nodes_upserted,
        edges = report.edges_upserted,
        "graph build complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_core::types::identifiers::{FileId, PoiId, RelationshipId, RunId};
    use ctp_core::types::{PoiType, Relationship, RelationshipType, Run};
    use ctp_storage::SqliteStorage;
    use ctp_testkit::InMemoryGraph;

    fn poi(run_id: &RunId, name: &str) -> Poi {
        Poi {
            id: PoiId::generate(),
            file_id: FileId::generate(),
            run_id: run_id.clone(),
            semantic_id: format!("function:{name}@a.rs:1"),
            name: name.to_string(),
            poi_type: PoiType::Function,
            start_line: 1,
            end_line: 2,
            description: String::new(),
        }
    }

    #[test]
    fn builds_graph_from_validated_relationships() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.initialize().unwrap();
        let run = Run::start("/repo");
        storage.insert_run(&run).unwrap();

        let a = poi(&run.id, "a");
        let b = poi(&run.id, "b");
        storage.upsert_poi(&a).unwrap();
        storage.upsert_poi(&b).unwrap();

        let rel = Relationship {
            id: RelationshipId::generate(),
            run_id: run.id.clone(),
            source_poi_id: a.id.clone(),
            target_poi_id: b.id.clone(),
            relationship_type: RelationshipType::Calls,
            confidence: 0.9,
            status: RelationshipStatus::Validated,
            reason: String::new(),
            evidence_hash: String::new(),
        };
        storage.upsert_relationship(&rel).unwrap();

        let graph = InMemoryGraph::new();
        let report = build_graph(&storage, &graph, run.id.as_str()).unwrap();

        assert_eq!(report.batches, 1);
        assert_eq!(report.nodes_upserted, 2);
        assert_eq!(report.edges_upserted, 1);
        assert_eq!(report.edges_skipped_orphan, 0);
        assert_eq!(graph.node_count().unwrap(), 2);
        assert_eq!(graph.edge_count().unwrap(), 1);
    }

    #[test]
    fn empty_run_builds_an_empty_graph() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.initialize().unwrap();
        let run = Run::start("/repo");
        storage.insert_run(&run).unwrap();

        let graph = InMemoryGraph::new();
        let report = build_graph(&storage, &graph, run.id.as_str()).unwrap();

        assert_eq!(report.batches, 0);
        assert_eq!(report.nodes_upserted, 0);
        assert_eq!(report.edges_upserted, 0);
    }
}
