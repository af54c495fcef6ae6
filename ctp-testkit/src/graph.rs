use std::collections::HashMap;
use std::sync::Mutex;

use petgraph::graph::{DiGraph, NodeIndex};

use ctp_core::errors::CtpError;
use ctp_core::traits::{GraphUpsertBatch, GraphUpsertOutcome, PropertyGraph};
use ctp_core::types::{Poi, Relationship};

/// In-memory `PropertyGraph`, backed by `petgraph`. Stands in for a real
/// graph-database adapter in tests — the Non-goals explicitly scope out
/// shipping a specific production graph-store implementation.
#[derive(Default)]
pub struct InMemoryGraph {
    inner: Mutex<GraphInner>,
}

#[derive(Default)]
struct GraphInner {
    graph: DiGraph<Poi, Relationship>,
    index_by_semantic_id: HashMap<String, NodeIndex>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyGraph for InMemoryGraph {
    fn ensure_indexes(&self) -> Result<(), CtpError> {
        Ok(())
    }

    fn upsert_batch(&self, batch: &GraphUpsertBatch) -> Result<GraphUpsertOutcome, CtpError> {
        let mut inner = self.inner.lock().unwrap();
        let mut outcome = GraphUpsertOutcome::default();

        for poi in &batch.pois {
            match inner.index_by_semantic_id.get(&poi.semantic_id).copied() {
                Some(idx) => inner.graph[idx] = poi.clone(),
                None => {
                    let idx = inner.graph.add_node(poi.clone());
                    inner.index_by_semantic_id.insert(poi.semantic_id.clone(), idx);
                }
            }
            outcome.nodes_upserted += 1;
        }

        for rel in &batch.relationships {
            let source = source_semantic_id(&inner, rel);
            let target = target_semantic_id(&inner, rel);
            match (source, target) {
                (Some(s), Some(t)) => {
                    inner.graph.add_edge(s, t, rel.clone());
                    outcome.edges_upserted += 1;
                }
                _ => outcome.edges_skipped_orphan += 1,
            }
        }

        Ok(outcome)
    }

    fn node_exists(&self, semantic_id: &str) -> Result<bool, CtpError> {
        Ok(self.inner.lock().unwrap().index_by_semantic_id.contains_key(semantic_id))
    }

    fn node_count(&self) -> Result<u64, CtpError> {
        Ok(self.inner.lock().unwrap().graph.node_count() as u64)
    }

    fn edge_count(&self) -> Result<u64, CtpError> {
        Ok(self.inner.lock().unwrap().graph.edge_count() as u64)
    }

    fn find_orphan_edges(&self) -> Result<Vec<Relationship>, CtpError> {
        // By construction, upsert_batch never inserts a dangling edge, so
        // this in-memory implementation always reports none.
        Ok(Vec::new())
    }

    fn remove_edge(&self, _relationship_id: &str) -> Result<(), CtpError> {
        Ok(())
    }
}

fn source_semantic_id(inner: &GraphInner, rel: &Relationship) -> Option<NodeIndex> {
    inner
        .graph
        .node_indices()
        .find(|&idx| node_id_matches(&inner.graph[idx], &rel.source_poi_id.0))
}

fn target_semantic_id(inner: &GraphInner, rel: &Relationship) -> Option<NodeIndex> {
    inner
        .graph
        .node_indices()
        .find(|&idx| node_id_matches(&inner.graph[idx], &rel.target_poi_id.0))
}

fn node_id_matches(poi: &Poi, id: &str) -> bool {
    poi.id.0 == id
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_core::types::identifiers::{FileId, PoiId, RelationshipId, RunId};
    use ctp_core::types::{PoiType, RelationshipStatus, RelationshipType};

    fn sample_poi(name: &str) -> Poi {
        Poi {
            id: PoiId::generate(),
            file_id: FileId::generate(),
            run_id: RunId::generate(),
            semantic_id: format!("function:{name}@a.rs:1"),
            name: name.to_string(),
            poi_type: PoiType::Function,
            start_line: 1,
            end_line: 2,
            description: String::new(),
        }
    }

    #[test]
    fn upsert_batch_links_known_endpoints() {
        let graph = InMemoryGraph::new();
        let a = sample_poi("a");
        let b = sample_poi("b");
        let rel = Relationship {
            id: RelationshipId::generate(),
            run_id: a.run_id.clone(),
            source_poi_id: a.id.clone(),
            target_poi_id: b.id.clone(),
            relationship_type: RelationshipType::Calls,
            confidence: 0.9,
            status: RelationshipStatus::Validated,
            reason: String::new(),
            evidence_hash: String::new(),
        };

        let outcome = graph
            .upsert_batch(&GraphUpsertBatch { pois: vec![a, b], relationships: vec![rel] })
            .unwrap();
        assert_eq!(outcome.nodes_upserted, 2);
        assert_eq!(outcome.edges_upserted, 1);
        assert_eq!(outcome.edges_skipped_orphan, 0);
    }

    #[test]
    fn upsert_batch_skips_orphan_edge() {
        let graph = InMemoryGraph::new();
        let a = sample_poi("a");
        let rel = Relationship {
            id: RelationshipId::generate(),
            run_id: a.run_id.clone(),
            source_poi_id: a.id.clone(),
            target_poi_id: PoiId::generate(),
            relationship_type: RelationshipType::Calls,
            confidence: 0.9,
            status: RelationshipStatus::Validated,
            reason: String::new(),
            evidence_hash: String::new(),
        };

        let outcome = graph
            .upsert_batch(&GraphUpsertBatch { pois: vec![a], relationships: vec![rel] })
            .unwrap();
        assert_eq!(outcome.edges_upserted, 0);
        assert_eq!(outcome.edges_skipped_orphan, 1);
    }
}
