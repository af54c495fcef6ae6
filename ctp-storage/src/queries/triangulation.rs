use rusqlite::{params, Connection, OptionalExtension};

use ctp_core::errors::StorageError;
use ctp_core::types::identifiers::{RelationshipId, SessionId, SubAgentId};
use ctp_core::types::{AgentKind, SessionStatus, SubAgentAnalysis, TriangulationSession};

pub fn upsert_session(conn: &Connection, session: &TriangulationSession) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO triangulation_sessions (id, relationship_id, status, final_confidence, consensus_score, strategy)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             status = excluded.status,
             final_confidence = excluded.final_confidence,
             consensus_score = excluded.consensus_score",
        params![
            session.id.as_str(),
            session.relationship_id.as_str(),
            status_str(session.status),
            session.final_confidence,
            session.consensus_score,
            session.strategy,
        ],
    )?;
    Ok(())
}

pub fn get_session(conn: &Connection, session_id: &str) -> Result<Option<TriangulationSession>, StorageError> {
    conn.query_row(
        "SELECT id, relationship_id, status, final_confidence, consensus_score, strategy
         FROM triangulation_sessions WHERE id = ?1",
        params![session_id],
        row_to_session,
    )
    .optional()
    .map_err(StorageError::from)
}

pub fn find_open_session_for_relationship(
    conn: &Connection,
    relationship_id: &str,
) -> Result<Option<TriangulationSession>, StorageError> {
    conn.query_row(
        "SELECT id, relationship_id, status, final_confidence, consensus_score, strategy
         FROM triangulation_sessions WHERE relationship_id = ?1 AND status = 'OPEN'
         ORDER BY rowid DESC LIMIT 1",
        params![relationship_id],
        row_to_session,
    )
    .optional()
    .map_err(StorageError::from)
}

pub fn insert_sub_agent_analysis(conn: &Connection, analysis: &SubAgentAnalysis) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO sub_agent_analyses (id, session_id, agent_kind, verdict_confidence, reasoning)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            analysis.id.as_str(),
            analysis.session_id.as_str(),
            agent_kind_str(analysis.agent_kind),
            analysis.verdict_confidence,
            analysis.reasoning,
        ],
    )?;
    Ok(())
}

pub fn analyses_for_session(conn: &Connection, session_id: &str) -> Result<Vec<SubAgentAnalysis>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, agent_kind, verdict_confidence, reasoning
         FROM sub_agent_analyses WHERE session_id = ?1",
    )?;
    let rows = stmt.query_map(params![session_id], |row| {
        let kind_str: String = row.get(2)?;
        Ok(SubAgentAnalysis {
            id: SubAgentId::new(row.get::<_, String>(0)?),
            session_id: SessionId::new(row.get::<_, String>(1)?),
            agent_kind: parse_agent_kind(&kind_str),
            verdict_confidence: row.get(3)?,
            reasoning: row.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Open => "OPEN",
        SessionStatus::Running => "RUNNING",
        SessionStatus::Completed => "COMPLETED",
        SessionStatus::Failed => "FAILED",
    }
}

fn parse_status(s: &str) -> SessionStatus {
    match s {
        "RUNNING" => SessionStatus::Running,
        "COMPLETED" => SessionStatus::Completed,
        "FAILED" => SessionStatus::Failed,
        _ => SessionStatus::Open,
    }
}

fn agent_kind_str(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Syntactic => "syntactic",
        AgentKind::Semantic => "semantic",
        AgentKind::Contextual => "contextual",
        AgentKind::Architecture => "architecture",
        AgentKind::Security => "security",
        AgentKind::Performance => "performance",
    }
}

fn parse_agent_kind(s: &str) -> AgentKind {
    match s {
        "semantic" => AgentKind::Semantic,
        "contextual" => AgentKind::Contextual,
        "architecture" => AgentKind::Architecture,
        "security" => AgentKind::Security,
        "performance" => AgentKind::Performance,
        _ => AgentKind::Syntactic,
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<TriangulationSession> {
    let status_str: String = row.get(2)?;
    Ok(TriangulationSession {
        id: SessionId::new(row.get::<_, String>(0)?),
        relationship_id: RelationshipId::new(row.get::<_, String>(1)?),
        status: parse_status(&status_str),
        final_confidence: row.get(3)?,
        consensus_score: row.get(4)?,
        strategy: row.get(5)?,
    })
}
