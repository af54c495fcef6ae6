//! `PipelineStorage` — abstraction over the relational store (§6).
//!
//! Grounded on `cortex-drift-bridge::traits::IBridgeStorage`: a single trait
//! naming every read/write the rest of the workspace needs, with row types
//! separate from the domain types in `ctp_core::types` (storage rows are the
//! literal persisted shape; domain types are what components reason about).

use crate::errors::StorageError;
use crate::types::{
    OutboxEvent, Poi, Relationship, RelationshipEvidence, RelationshipStatus, Run, SourceFile,
    SubAgentAnalysis, TriangulationSession,
};

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage statistics surfaced by the health endpoint.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StorageStats {
    pub file_count: u64,
    pub poi_count: u64,
    pub relationship_count: u64,
    pub evidence_count: u64,
    pub pending_outbox_count: u64,
}

/// Abstraction over the relational store backing runs, files, POIs,
/// relationships, evidence, triangulation sessions, and the outbox.
pub trait PipelineStorage: Send + Sync {
    // ── Runs & files ──
    fn insert_run(&self, run: &Run) -> StorageResult<()>;
    fn seal_run(&self, run_id: &str) -> StorageResult<()>;
    fn get_run(&self, run_id: &str) -> StorageResult<Option<Run>>;
    fn insert_file(&self, file: &SourceFile) -> StorageResult<()>;

    // ── POIs ──
    /// Insert a POI, enforcing invariant I4 (unique semantic_id per run) at
    /// the storage layer via a unique index; duplicate inserts are no-ops.
    fn upsert_poi(&self, poi: &Poi) -> StorageResult<()>;
    fn get_poi(&self, run_id: &str, poi_id: &str) -> StorageResult<Option<Poi>>;
    fn find_poi_by_semantic_id(&self, run_id: &str, semantic_id: &str) -> StorageResult<Option<Poi>>;
    fn pois_for_run(&self, run_id: &str) -> StorageResult<Vec<Poi>>;

    // ── Relationships ──
    fn upsert_relationship(&self, relationship: &Relationship) -> StorageResult<()>;
    fn get_relationship(&self, relationship_id: &str) -> StorageResult<Option<Relationship>>;
    fn set_relationship_status(
        &self,
        relationship_id: &str,
        status: RelationshipStatus,
        confidence: Option<f64>,
    ) -> StorageResult<()>;
    fn relationships_by_status(
        &self,
        run_id: &str,
        status: RelationshipStatus,
    ) -> StorageResult<Vec<Relationship>>;
    fn find_relationship_by_evidence_hash(
        &self,
        run_id: &str,
        evidence_hash: &str,
    ) -> StorageResult<Option<Relationship>>;

    // ── Evidence ──
    fn insert_evidence(&self, evidence: &RelationshipEvidence) -> StorageResult<()>;
    fn evidence_for_relationship(&self, relationship_id: &str) -> StorageResult<Vec<RelationshipEvidence>>;

    // ── Triangulation ──
    fn upsert_session(&self, session: &TriangulationSession) -> StorageResult<()>;
    fn get_session(&self, session_id: &str) -> StorageResult<Option<TriangulationSession>>;
    /// The most recently opened OPEN session for a relationship, if any —
    /// lets a caller resume the session the outbox publisher created
    /// without re-deriving its id.
    fn find_open_session_for_relationship(&self, relationship_id: &str) -> StorageResult<Option<TriangulationSession>>;
    fn insert_sub_agent_analysis(&self, analysis: &SubAgentAnalysis) -> StorageResult<()>;
    fn sub_agent_analyses_for_session(&self, session_id: &str) -> StorageResult<Vec<SubAgentAnalysis>>;

    // ── Outbox ──
    fn insert_outbox_event(&self, event: &OutboxEvent) -> StorageResult<()>;
    fn pending_outbox_events(&self, kind_priority_order: &[&str], limit: usize) -> StorageResult<Vec<OutboxEvent>>;
    fn mark_outbox_published(&self, event_id: &str) -> StorageResult<()>;

    // ── Lifecycle ──
    fn initialize(&self) -> StorageResult<()>;
    fn migrate(&self) -> StorageResult<u32>;
    fn health_check(&self) -> StorageResult<bool>;
    fn stats(&self, run_id: &str) -> StorageResult<StorageStats>;
}

impl<T: PipelineStorage + ?Sized> PipelineStorage for std::sync::Arc<T> {
    fn insert_run(&self, run: &Run) -> StorageResult<()> {
        (**self).insert_run(run)
    }
    fn seal_run(&self, run_id: &str) -> StorageResult<()> {
        (**self).seal_run(run_id)
    }
    fn get_run(&self, run_id: &str) -> StorageResult<Option<Run>> {
        (**self).get_run(run_id)
    }
    fn insert_file(&self, file: &SourceFile) -> StorageResult<()> {
        (**self).insert_file(file)
    }
    fn upsert_poi(&self, poi: &Poi) -> StorageResult<()> {
        (**self).upsert_poi(poi)
    }
    fn get_poi(&self, run_id: &str, poi_id: &str) -> StorageResult<Option<Poi>> {
        (**self).get_poi(run_id, poi_id)
    }
    fn find_poi_by_semantic_id(&self, run_id: &str, semantic_id: &str) -> StorageResult<Option<Poi>> {
        (**self).find_poi_by_semantic_id(run_id, semantic_id)
    }
    fn pois_for_run(&self, run_id: &str) -> StorageResult<Vec<Poi>> {
        (**self).pois_for_run(run_id)
    }
    fn upsert_relationship(&self, relationship: &Relationship) -> StorageResult<()> {
        (**self).upsert_relationship(relationship)
    }
    fn get_relationship(&self, relationship_id: &str) -> StorageResult<Option<Relationship>> {
        (**self).get_relationship(relationship_id)
    }
    fn set_relationship_status(
        &self,
        relationship_id: &str,
        status: RelationshipStatus,
        confidence: Option<f64>,
    ) -> StorageResult<()> {
        (**self).set_relationship_status(relationship_id, status, confidence)
    }
    fn relationships_by_status(
        &self,
        run_id: &str,
        status: RelationshipStatus,
    ) -> StorageResult<Vec<Relationship>> {
        (**self).relationships_by_status(run_id, status)
    }
    fn find_relationship_by_evidence_hash(
        &self,
        run_id: &str,
        evidence_hash: &str,
    ) -> StorageResult<Option<Relationship>> {
        (**self).find_relationship_by_evidence_hash(run_id, evidence_hash)
    }
    fn insert_evidence(&self, evidence: &RelationshipEvidence) -> StorageResult<()> {
        (**self).insert_evidence(evidence)
    }
    fn evidence_for_relationship(&self, relationship_id: &str) -> StorageResult<Vec<RelationshipEvidence>> {
        (**self).evidence_for_relationship(relationship_id)
    }
    fn upsert_session(&self, session: &TriangulationSession) -> StorageResult<()> {
        (**self).upsert_session(session)
    }
    fn get_session(&self, session_id: &str) -> StorageResult<Option<TriangulationSession>> {
        (**self).get_session(session_id)
    }
    fn find_open_session_for_relationship(&self, relationship_id: &str) -> StorageResult<Option<TriangulationSession>> {
        (**self).find_open_session_for_relationship(relationship_id)
    }
    fn insert_sub_agent_analysis(&self, analysis: &SubAgentAnalysis) -> StorageResult<()> {
        (**self).insert_sub_agent_analysis(analysis)
    }
    fn sub_agent_analyses_for_session(&self, session_id: &str) -> StorageResult<Vec<SubAgentAnalysis>> {
        (**self).sub_agent_analyses_for_session(session_id)
    }
    fn insert_outbox_event(&self, event: &OutboxEvent) -> StorageResult<()> {
        (**self).insert_outbox_event(event)
    }
    fn pending_outbox_events(&self, kind_priority_order: &[&str], limit: usize) -> StorageResult<Vec<OutboxEvent>> {
        (**self).pending_outbox_events(kind_priority_order, limit)
    }
    fn mark_outbox_published(&self, event_id: &str) -> StorageResult<()> {
        (**self).mark_outbox_published(event_id)
    }
    fn initialize(&self) -> StorageResult<()> {
        (**self).initialize()
    }
    fn migrate(&self) -> StorageResult<u32> {
        (**self).migrate()
    }
    fn health_check(&self) -> StorageResult<bool> {
        (**self).health_check()
    }
    fn stats(&self, run_id: &str) -> StorageResult<StorageStats> {
        (**self).stats(run_id)
    }
}
