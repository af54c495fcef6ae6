use serde::{Deserialize, Serialize};

use super::identifiers::{PoiId, RelationshipId, RunId};

/// Relationship kind, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Calls,
    Uses,
    Extends,
    Imports,
    Contains,
    References,
    HasColumn,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calls => "CALLS",
            Self::Uses => "USES",
            Self::Extends => "EXTENDS",
            Self::Imports => "IMPORTS",
            Self::Contains => "CONTAINS",
            Self::References => "REFERENCES",
            Self::HasColumn => "HAS_COLUMN",
        }
    }
}

/// Relationship lifecycle status (§3). `PROCESSING` is deliberately omitted
/// per the open question in §9 — reconciliation treats transient processing
/// as in-memory only, never persisted as a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipStatus {
    Pending,
    Validated,
    Discarded,
    Failed,
}

/// Directed edge between two POIs (§3). Holds weak (id-based) references to
/// its endpoints — the relational store is the sole resolver (§9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub run_id: RunId,
    pub source_poi_id: PoiId,
    pub target_poi_id: PoiId,
    pub relationship_type: RelationshipType,
    pub confidence: f64,
    pub status: RelationshipStatus,
    pub reason: String,
    pub evidence_hash: String,
}

impl Relationship {
    /// Invariant I2: `confidence ∈ [0,1]`; VALIDATED implies `confidence > 0`.
    pub fn satisfies_i2(&self) -> bool {
        let in_range = (0.0..=1.0).contains(&self.confidence);
        let validated_nonzero =
            self.status != RelationshipStatus::Validated || self.confidence > 0.0;
        in_range && validated_nonzero
    }
}

/// `evidence_hash = H(from ‖ to ‖ type)` (§4.2, glossary) — a relationship's
/// identity across runs, stable across processes and versions.
pub fn compute_evidence_hash(from: &str, to: &str, relationship_type: RelationshipType) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(from.as_bytes());
    hasher.update(b"\xe2\x80\x96"); // literal "‖" separator bytes, stable across builds
    hasher.update(to.as_bytes());
    hasher.update(b"\xe2\x80\x96");
    hasher.update(relationship_type.as_str().as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_hash_is_stable() {
        let a = compute_evidence_hash("foo.rs:bar", "foo.rs:baz", RelationshipType::Calls);
        let b = compute_evidence_hash("foo.rs:bar", "foo.rs:baz", RelationshipType::Calls);
        assert_eq!(a, b);
    }

    #[test]
    fn evidence_hash_distinguishes_direction() {
        let a = compute_evidence_hash("a", "b", RelationshipType::Calls);
        let b = compute_evidence_hash("b", "a", RelationshipType::Calls);
        assert_ne!(a, b);
    }

    #[test]
    fn i2_rejects_validated_zero_confidence() {
        let rel = Relationship {
            id: RelationshipId::generate(),
            run_id: RunId::generate(),
            source_poi_id: PoiId::generate(),
            target_poi_id: PoiId::generate(),
            relationship_type: RelationshipType::Calls,
            confidence: 0.0,
            status: RelationshipStatus::Validated,
            reason: String::new(),
            evidence_hash: String::new(),
        };
        assert!(!rel.satisfies_i2());
    }
}
