use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use ctp_core::errors::StorageError;
use ctp_core::types::run::SourceFile;
use ctp_core::types::Run;
use ctp_core::types::identifiers::RunId;

pub fn insert_run(conn: &Connection, run: &Run) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO runs (id, started_at, target_root, sealed_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            run.id.as_str(),
            run.started_at.to_rfc3339(),
            run.target_root,
            run.sealed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn seal_run(conn: &Connection, run_id: &str) -> Result<(), StorageError> {
    let updated = conn.execute(
        "UPDATE runs SET sealed_at = ?1 WHERE id = ?2",
        params![Utc::now().to_rfc3339(), run_id],
    )?;
    if updated == 0 {
        return Err(StorageError::NotFound { what: format!("run {run_id}") });
    }
    Ok(())
}

pub fn get_run(conn: &Connection, run_id: &str) -> Result<Option<Run>, StorageError> {
    conn.query_row(
        "SELECT id, started_at, target_root, sealed_at FROM runs WHERE id = ?1",
        params![run_id],
        |row| {
            let started_at: String = row.get(1)?;
            let sealed_at: Option<String> = row.get(3)?;
            Ok(Run {
                id: RunId::new(row.get::<_, String>(0)?),
                started_at: parse_dt(&started_at),
                target_root: row.get(2)?,
                sealed_at: sealed_at.map(|s| parse_dt(&s)),
            })
        },
    )
    .optional()
    .map_err(StorageError::from)
}

pub fn insert_file(conn: &Connection, file: &SourceFile) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO source_files (id, run_id, path, content_hash) VALUES (?1, ?2, ?3, ?4)",
        params![file.id.as_str(), file.run_id.as_str(), file.path, file.content_hash],
    )?;
    Ok(())
}

pub fn file_count(conn: &Connection, run_id: &str) -> Result<u64, StorageError> {
    conn.query_row(
        "SELECT COUNT(*) FROM source_files WHERE run_id = ?1",
        params![run_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(StorageError::from)
}

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}
