use chrono::Utc;
use rusqlite::params;
use rusqlite::Connection;

use ctp_core::errors::StorageError;
use ctp_core::types::identifiers::{OutboxEventId, RunId};
use ctp_core::types::{OutboxEvent, OutboxEventKind};

pub fn insert_event(conn: &Connection, event: &OutboxEvent) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO outbox_events (id, kind, payload_json, run_id, published_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            event.id.as_str(),
            kind_str(event.kind),
            event.payload.to_string(),
            event.run_id.as_str(),
            event.published_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

/// Fetch up to `limit` unpublished events, ordered per `kind_priority_order`
/// (lowest index first), then by rowid within a kind (FIFO).
pub fn pending_events(
    conn: &Connection,
    kind_priority_order: &[&str],
    limit: usize,
) -> Result<Vec<OutboxEvent>, StorageError> {
    let mut out = Vec::new();
    for kind in kind_priority_order {
        if out.len() >= limit {
            break;
        }
        let remaining = limit - out.len();
        let mut stmt = conn.prepare(
            "SELECT id, kind, payload_json, run_id, published_at
             FROM outbox_events WHERE kind = ?1 AND published_at IS NULL
             ORDER BY rowid ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![kind, remaining as i64], row_to_event)?;
        for row in rows {
            out.push(row?);
        }
    }
    Ok(out)
}

pub fn mark_published(conn: &Connection, event_id: &str) -> Result<(), StorageError> {
    let updated = conn.execute(
        "UPDATE outbox_events SET published_at = ?1 WHERE id = ?2",
        params![Utc::now().to_rfc3339(), event_id],
    )?;
    if updated == 0 {
        return Err(StorageError::NotFound { what: format!("outbox event {event_id}") });
    }
    Ok(())
}

pub fn pending_count(conn: &Connection, run_id: &str) -> Result<u64, StorageError> {
    conn.query_row(
        "SELECT COUNT(*) FROM outbox_events WHERE run_id = ?1 AND published_at IS NULL",
        params![run_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(StorageError::from)
}

fn kind_str(kind: OutboxEventKind) -> &'static str {
    match kind {
        OutboxEventKind::PoiBatch => "poi-batch",
        OutboxEventKind::DirectoryFinding => "directory-finding",
        OutboxEventKind::RelationshipFinding => "relationship-finding",
    }
}

fn parse_kind(s: &str) -> OutboxEventKind {
    match s {
        "directory-finding" => OutboxEventKind::DirectoryFinding,
        "relationship-finding" => OutboxEventKind::RelationshipFinding,
        _ => OutboxEventKind::PoiBatch,
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboxEvent> {
    let kind_str: String = row.get(1)?;
    let payload_str: String = row.get(2)?;
    let published_at: Option<String> = row.get(4)?;
    Ok(OutboxEvent {
        id: OutboxEventId::new(row.get::<_, String>(0)?),
        kind: parse_kind(&kind_str),
        payload: serde_json::from_str(&payload_str).unwrap_or(serde_json::Value::Null),
        run_id: RunId::new(row.get::<_, String>(3)?),
        published_at: published_at.map(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now())
        }),
    })
}
