//! The unit the validation pipeline operates on: one relationship as
//! observed under one analysis mode (§4.4).

use chrono::{DateTime, Utc};

use ctp_core::types::identifiers::RelationshipId;
use ctp_core::types::{RelationshipType, SourceMode};

/// Where a relationship's endpoints sit relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    File,
    Module,
    CrossFile,
    Global,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct RelationshipCandidate {
    pub relationship_id: RelationshipId,
    pub from: String,
    pub to: String,
    pub relationship_type: RelationshipType,
    pub confidence: f64,
    pub scope: Scope,
    pub source_mode: SourceMode,
    pub observed_at: DateTime<Utc>,
    /// Set by pre-validation (§4.4.1); starts as the raw confidence and is
    /// the sort key resolution strategies pick among otherwise-tied rows.
    pub priority: f64,
}

impl RelationshipCandidate {
    /// `(from_lc, type_lc, to_lc)` — the dedup/grouping key across modes.
    pub fn semantic_key(&self) -> String {
        format!("{}::{:?}::{}", self.from.to_lowercase(), self.relationship_type, self.to.to_lowercase())
    }

    pub fn is_well_formed(&self) -> bool {
        !self.from.trim().is_empty() && !self.to.trim().is_empty() && (0.0..=1.0).contains(&self.confidence)
    }
}
