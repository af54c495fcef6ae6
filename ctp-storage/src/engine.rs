//! `SqliteStorage` — the `PipelineStorage` implementation backing the
//! pipeline binary. Wraps a `ConnectionPool`; all reads go through the
//! reader pool, all writes through the single writer mutex.

use std::path::Path;

use ctp_core::errors::StorageError;
use ctp_core::traits::storage::{PipelineStorage, StorageResult, StorageStats};
use ctp_core::types::{
    OutboxEvent, Poi, Relationship, RelationshipEvidence, RelationshipStatus, Run, SourceFile,
    SubAgentAnalysis, TriangulationSession,
};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{evidence, outbox, poi, relationship, run, triangulation};

pub struct SqliteStorage {
    pool: ConnectionPool,
}

impl SqliteStorage {
    pub fn open(path: &Path, read_pool_size: usize) -> StorageResult<Self> {
        Ok(Self { pool: ConnectionPool::open(path, read_pool_size)? })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self { pool: ConnectionPool::open_in_memory()? })
    }
}

impl PipelineStorage for SqliteStorage {
    fn insert_run(&self, r: &Run) -> StorageResult<()> {
        self.pool.with_writer(|conn| run::insert_run(conn, r))
    }

    fn seal_run(&self, run_id: &str) -> StorageResult<()> {
        self.pool.with_writer(|conn| run::seal_run(conn, run_id))
    }

    fn get_run(&self, run_id: &str) -> StorageResult<Option<Run>> {
        self.pool.with_reader(|conn| run::get_run(conn, run_id))
    }

    fn insert_file(&self, file: &SourceFile) -> StorageResult<()> {
        self.pool.with_writer(|conn| run::insert_file(conn, file))
    }

    fn upsert_poi(&self, p: &Poi) -> StorageResult<()> {
        self.pool.with_writer(|conn| poi::upsert_poi(conn, p))
    }

    fn get_poi(&self, run_id: &str, poi_id: &str) -> StorageResult<Option<Poi>> {
        self.pool.with_reader(|conn| poi::get_poi(conn, run_id, poi_id))
    }

    fn find_poi_by_semantic_id(&self, run_id: &str, semantic_id: &str) -> StorageResult<Option<Poi>> {
        self.pool.with_reader(|conn| poi::find_by_semantic_id(conn, run_id, semantic_id))
    }

    fn pois_for_run(&self, run_id: &str) -> StorageResult<Vec<Poi>> {
        self.pool.with_reader(|conn| poi::pois_for_run(conn, run_id))
    }

    fn upsert_relationship(&self, r: &Relationship) -> StorageResult<()> {
        self.pool.with_writer(|conn| relationship::upsert_relationship(conn, r))
    }

    fn get_relationship(&self, relationship_id: &str) -> StorageResult<Option<Relationship>> {
        self.pool.with_reader(|conn| relationship::get_relationship(conn, relationship_id))
    }

    fn set_relationship_status(
        &self,
        relationship_id: &str,
        status: RelationshipStatus,
        confidence: Option<f64>,
    ) -> StorageResult<()> {
        self.pool
            .with_writer(|conn| relationship::set_status(conn, relationship_id, status, confidence))
    }

    fn relationships_by_status(&self, run_id: &str, status: RelationshipStatus) -> StorageResult<Vec<Relationship>> {
        self.pool.with_reader(|conn| relationship::by_status(conn, run_id, status))
    }

    fn find_relationship_by_evidence_hash(
        &self,
        run_id: &str,
        evidence_hash: &str,
    ) -> StorageResult<Option<Relationship>> {
        self.pool.with_reader(|conn| relationship::find_by_evidence_hash(conn, run_id, evidence_hash))
    }

    fn insert_evidence(&self, e: &RelationshipEvidence) -> StorageResult<()> {
        self.pool.with_writer(|conn| evidence::insert_evidence(conn, e))
    }

    fn evidence_for_relationship(&self, relationship_id: &str) -> StorageResult<Vec<RelationshipEvidence>> {
        self.pool.with_reader(|conn| evidence::evidence_for_relationship(conn, relationship_id))
    }

    fn upsert_session(&self, s: &TriangulationSession) -> StorageResult<()> {
        self.pool.with_writer(|conn| triangulation::upsert_session(conn, s))
    }

    fn get_session(&self, session_id: &str) -> StorageResult<Option<TriangulationSession>> {
        self.pool.with_reader(|conn| triangulation::get_session(conn, session_id))
    }
    fn find_open_session_for_relationship(&self, relationship_id: &str) -> StorageResult<Option<TriangulationSession>> {
        self.pool
            .with_reader(|conn| triangulation::find_open_session_for_relationship(conn, relationship_id))
    }

    fn insert_sub_agent_analysis(&self, a: &SubAgentAnalysis) -> StorageResult<()> {
        self.pool.with_writer(|conn| triangulation::insert_sub_agent_analysis(conn, a))
    }

    fn sub_agent_analyses_for_session(&self, session_id: &str) -> StorageResult<Vec<SubAgentAnalysis>> {
        self.pool.with_reader(|conn| triangulation::analyses_for_session(conn, session_id))
    }

    fn insert_outbox_event(&self, e: &OutboxEvent) -> StorageResult<()> {
        self.pool.with_writer(|conn| outbox::insert_event(conn, e))
    }

    fn pending_outbox_events(&self, kind_priority_order: &[&str], limit: usize) -> StorageResult<Vec<OutboxEvent>> {
        self.pool.with_reader(|conn| outbox::pending_events(conn, kind_priority_order, limit))
    }

    fn mark_outbox_published(&self, event_id: &str) -> StorageResult<()> {
        self.pool.with_writer(|conn| outbox::mark_published(conn, event_id))
    }

    fn initialize(&self) -> StorageResult<()> {
        self.migrate().map(|_| ())
    }

    fn migrate(&self) -> StorageResult<u32> {
        self.pool.with_writer(|conn| migrations::migrate(conn))
    }

    fn health_check(&self) -> StorageResult<bool> {
        Ok(self.pool.is_wal_mode())
    }

    fn stats(&self, run_id: &str) -> StorageResult<StorageStats> {
        self.pool.with_reader(|conn| {
            Ok(StorageStats {
                file_count: run::file_count(conn, run_id)?,
                poi_count: poi::poi_count(conn, run_id)?,
                relationship_count: relationship::relationship_count(conn, run_id)?,
                evidence_count: evidence::evidence_count(conn, run_id)?,
                pending_outbox_count: outbox::pending_count(conn, run_id)?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_core::types::identifiers::FileId;
    use ctp_core::types::PoiType;

    #[test]
    fn migrate_then_roundtrip_run_and_poi() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.initialize().unwrap();

        let run = Run::start("/tmp/project");
        storage.insert_run(&run).unwrap();
        assert!(storage.get_run(run.id.as_str()).unwrap().is_some());

        let file = SourceFile {
            id: FileId::generate(),
            run_id: run.id.clone(),
            path: "src/lib.rs".to_string(),
            content_hash: "abc".to_string(),
        };
        storage.insert_file(&file).unwrap();

        let semantic_id = Poi::compute_semantic_id(PoiType::Function, "foo", "src/lib.rs", 10);
        let poi_row = Poi {
            id: ctp_core::types::identifiers::PoiId::generate(),
            file_id: file.id.clone(),
            run_id: run.id.clone(),
            semantic_id: semantic_id.clone(),
            name: "foo".to_string(),
            poi_type: PoiType::Function,
            start_line: 10,
            end_line: 20,
            description: String::new(),
        };
        storage.upsert_poi(&poi_row).unwrap();

        let found = storage.find_poi_by_semantic_id(run.id.as_str(), &semantic_id).unwrap();
        assert!(found.is_some());

        let stats = storage.stats(run.id.as_str()).unwrap();
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.poi_count, 1);
    }

    #[test]
    fn seal_unknown_run_errors() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.initialize().unwrap();
        let err = storage.seal_run("nonexistent").unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
