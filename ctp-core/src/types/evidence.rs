use serde::{Deserialize, Serialize};

use super::identifiers::{EvidenceId, RelationshipId, RunId};

/// Which analysis pass produced a piece of evidence (§4.4 cross-mode comparison).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Batch,
    Individual,
    Triangulated,
}

/// The payload a relationship-evidence row carries (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePayload {
    pub from: String,
    pub to: String,
    pub relationship_type: super::relationship::RelationshipType,
    pub confidence: f64,
    pub reason: String,
    pub source_mode: SourceMode,
}

/// Justification record supporting (or opposing) a relationship (§3).
/// Immutable; many-to-one to its relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipEvidence {
    pub id: EvidenceId,
    pub relationship_id: RelationshipId,
    pub relationship_hash: String,
    pub payload: EvidencePayload,
    pub run_id: RunId,
}
