//! Payload shapes carried inside an `OutboxEvent` (§3, §4.2). Producers
//! (the file/directory analysis stages) serialize these; the publisher
//! deserializes them on drain.

use serde::{Deserialize, Serialize};

use ctp_core::types::{Poi, RelationshipType, SourceMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiBatchPayload {
    pub pois: Vec<Poi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryFindingPayload {
    pub directory: String,
    pub poi_semantic_ids: Vec<String>,
    pub summary: String,
}

/// One relationship as reported by an analysis pass, keyed by the
/// endpoints' `semantic_id` rather than internal ids — the publisher is
/// responsible for resolving those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipFindingPayload {
    pub from_semantic_id: String,
    pub to_semantic_id: String,
    pub relationship_type: RelationshipType,
    pub reason: String,
    pub evidence_items: usize,
    pub source_mode: SourceMode,
}
