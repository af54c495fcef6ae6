use rusqlite::{params, Connection, OptionalExtension};

use ctp_core::errors::StorageError;
use ctp_core::types::identifiers::{PoiId, RelationshipId, RunId};
use ctp_core::types::{Relationship, RelationshipStatus, RelationshipType};

pub fn upsert_relationship(conn: &Connection, rel: &Relationship) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO relationships
             (id, run_id, source_poi_id, target_poi_id, relationship_type, confidence, status, reason, evidence_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(run_id, evidence_hash) DO UPDATE SET
             confidence = excluded.confidence,
             status = excluded.status,
             reason = excluded.reason",
        params![
            rel.id.as_str(),
            rel.run_id.as_str(),
            rel.source_poi_id.as_str(),
            rel.target_poi_id.as_str(),
            rel.relationship_type.as_str(),
            rel.confidence,
            status_str(rel.status),
            rel.reason,
            rel.evidence_hash,
        ],
    )?;
    Ok(())
}

pub fn get_relationship(conn: &Connection, relationship_id: &str) -> Result<Option<Relationship>, StorageError> {
    conn.query_row(
        "SELECT id, run_id, source_poi_id, target_poi_id, relationship_type, confidence, status, reason, evidence_hash
         FROM relationships WHERE id = ?1",
        params![relationship_id],
        row_to_relationship,
    )
    .optional()
    .map_err(StorageError::from)
}

pub fn set_status(
    conn: &Connection,
    relationship_id: &str,
    status: RelationshipStatus,
    confidence: Option<f64>,
) -> Result<(), StorageError> {
    let updated = match confidence {
        Some(c) => conn.execute(
            "UPDATE relationships SET status = ?1, confidence = ?2 WHERE id = ?3",
            params![status_str(status), c, relationship_id],
        )?,
        None => conn.execute(
            "UPDATE relationships SET status = ?1 WHERE id = ?2",
            params![status_str(status), relationship_id],
        )?,
    };
    if updated == 0 {
        return Err(StorageError::NotFound { what: format!("relationship {relationship_id}") });
    }
    Ok(())
}

pub fn by_status(conn: &Connection, run_id: &str, status: RelationshipStatus) -> Result<Vec<Relationship>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, run_id, source_poi_id, target_poi_id, relationship_type, confidence, status, reason, evidence_hash
         FROM relationships WHERE run_id = ?1 AND status = ?2",
    )?;
    let rows = stmt.query_map(params![run_id, status_str(status)], row_to_relationship)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn find_by_evidence_hash(
    conn: &Connection,
    run_id: &str,
    evidence_hash: &str,
) -> Result<Option<Relationship>, StorageError> {
    conn.query_row(
        "SELECT id, run_id, source_poi_id, target_poi_id, relationship_type, confidence, status, reason, evidence_hash
         FROM relationships WHERE run_id = ?1 AND evidence_hash = ?2",
        params![run_id, evidence_hash],
        row_to_relationship,
    )
    .optional()
    .map_err(StorageError::from)
}

pub fn relationship_count(conn: &Connection, run_id: &str) -> Result<u64, StorageError> {
    conn.query_row(
        "SELECT COUNT(*) FROM relationships WHERE run_id = ?1",
        params![run_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(StorageError::from)
}

fn status_str(status: RelationshipStatus) -> &'static str {
    match status {
        RelationshipStatus::Pending => "PENDING",
        RelationshipStatus::Validated => "VALIDATED",
        RelationshipStatus::Discarded => "DISCARDED",
        RelationshipStatus::Failed => "FAILED",
    }
}

fn parse_status(s: &str) -> RelationshipStatus {
    match s {
        "VALIDATED" => RelationshipStatus::Validated,
        "DISCARDED" => RelationshipStatus::Discarded,
        "FAILED" => RelationshipStatus::Failed,
        _ => RelationshipStatus::Pending,
    }
}

fn parse_type(s: &str) -> RelationshipType {
    match s {
        "USES" => RelationshipType::Uses,
        "EXTENDS" => RelationshipType::Extends,
        "IMPORTS" => RelationshipType::Imports,
        "CONTAINS" => RelationshipType::Contains,
        "REFERENCES" => RelationshipType::References,
        "HAS_COLUMN" => RelationshipType::HasColumn,
        _ => RelationshipType::Calls,
    }
}

fn row_to_relationship(row: &rusqlite::Row<'_>) -> rusqlite::Result<Relationship> {
    let type_str: String = row.get(4)?;
    let status_str: String = row.get(6)?;
    Ok(Relationship {
        id: RelationshipId::new(row.get::<_, String>(0)?),
        run_id: RunId::new(row.get::<_, String>(1)?),
        source_poi_id: PoiId::new(row.get::<_, String>(2)?),
        target_poi_id: PoiId::new(row.get::<_, String>(3)?),
        relationship_type: parse_type(&type_str),
        confidence: row.get(5)?,
        status: parse_status(&status_str),
        reason: row.get(7)?,
        evidence_hash: row.get(8)?,
    })
}
