use rusqlite::params;
use rusqlite::Connection;

use ctp_core::errors::StorageError;
use ctp_core::types::evidence::EvidencePayload;
use ctp_core::types::identifiers::{EvidenceId, RelationshipId, RunId};
use ctp_core::types::RelationshipEvidence;

pub fn insert_evidence(conn: &Connection, evidence: &RelationshipEvidence) -> Result<(), StorageError> {
    let payload_json = serde_json::to_string(&evidence.payload)
        .map_err(|e| StorageError::Constraint(format!("evidence payload serialize: {e}")))?;
    conn.execute(
        "INSERT INTO relationship_evidence (id, relationship_id, relationship_hash, run_id, payload_json)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            evidence.id.as_str(),
            evidence.relationship_id.as_str(),
            evidence.relationship_hash,
            evidence.run_id.as_str(),
            payload_json,
        ],
    )?;
    Ok(())
}

pub fn evidence_count(conn: &Connection, run_id: &str) -> Result<u64, StorageError> {
    conn.query_row(
        "SELECT COUNT(*) FROM relationship_evidence WHERE run_id = ?1",
        params![run_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(StorageError::from)
}

pub fn evidence_for_relationship(
    conn: &Connection,
    relationship_id: &str,
) -> Result<Vec<RelationshipEvidence>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, relationship_id, relationship_hash, run_id, payload_json
         FROM relationship_evidence WHERE relationship_id = ?1",
    )?;
    let rows = stmt.query_map(params![relationship_id], |row| {
        let payload_json: String = row.get(4)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            payload_json,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, relationship_id, relationship_hash, run_id, payload_json) = row?;
        let payload: EvidencePayload = serde_json::from_str(&payload_json)
            .map_err(|e| StorageError::Constraint(format!("evidence payload parse: {e}")))?;
        out.push(RelationshipEvidence {
            id: EvidenceId::new(id),
            relationship_id: RelationshipId::new(relationship_id),
            relationship_hash,
            payload,
            run_id: RunId::new(run_id),
        });
    }
    Ok(out)
}
