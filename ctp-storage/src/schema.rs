//! Schema DDL for the CTP relational store (§3). One `CREATE TABLE`
//! statement per data-model entity, applied as a single batch by the v1
//! migration.

pub const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS runs (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    target_root TEXT NOT NULL,
    sealed_at TEXT
);

CREATE TABLE IF NOT EXISTS source_files (
    id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(id),
    path TEXT NOT NULL,
    content_hash TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_source_files_run ON source_files(run_id);

CREATE TABLE IF NOT EXISTS pois (
    id TEXT PRIMARY KEY,
    file_id TEXT NOT NULL REFERENCES source_files(id),
    run_id TEXT NOT NULL REFERENCES runs(id),
    semantic_id TEXT NOT NULL,
    name TEXT NOT NULL,
    poi_type TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);
-- invariant I4: semantic_id unique per run
CREATE UNIQUE INDEX IF NOT EXISTS idx_pois_run_semantic ON pois(run_id, semantic_id);
CREATE INDEX IF NOT EXISTS idx_pois_run ON pois(run_id);

CREATE TABLE IF NOT EXISTS relationships (
    id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(id),
    source_poi_id TEXT NOT NULL,
    target_poi_id TEXT NOT NULL,
    relationship_type TEXT NOT NULL,
    confidence REAL NOT NULL,
    status TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    evidence_hash TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_relationships_run_status ON relationships(run_id, status);
CREATE UNIQUE INDEX IF NOT EXISTS idx_relationships_run_hash ON relationships(run_id, evidence_hash);

CREATE TABLE IF NOT EXISTS relationship_evidence (
    id TEXT PRIMARY KEY,
    relationship_id TEXT NOT NULL REFERENCES relationships(id),
    relationship_hash TEXT NOT NULL,
    run_id TEXT NOT NULL REFERENCES runs(id),
    payload_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_evidence_relationship ON relationship_evidence(relationship_id);

CREATE TABLE IF NOT EXISTS triangulation_sessions (
    id TEXT PRIMARY KEY,
    relationship_id TEXT NOT NULL REFERENCES relationships(id),
    status TEXT NOT NULL,
    final_confidence REAL,
    consensus_score REAL,
    strategy TEXT NOT NULL DEFAULT 'default'
);
CREATE INDEX IF NOT EXISTS idx_sessions_relationship ON triangulation_sessions(relationship_id);

CREATE TABLE IF NOT EXISTS sub_agent_analyses (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES triangulation_sessions(id),
    agent_kind TEXT NOT NULL,
    verdict_confidence REAL NOT NULL,
    reasoning TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_sub_agent_session ON sub_agent_analyses(session_id);

CREATE TABLE IF NOT EXISTS outbox_events (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    run_id TEXT NOT NULL REFERENCES runs(id),
    published_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_outbox_pending ON outbox_events(run_id, published_at);
";
