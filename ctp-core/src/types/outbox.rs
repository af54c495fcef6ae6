use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{OutboxEventId, RunId};

/// The three outbox event kinds, in the priority order the publisher drains
/// them (§4.2): POI batches first, directory findings second, relationship
/// findings last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutboxEventKind {
    PoiBatch,
    DirectoryFinding,
    RelationshipFinding,
}

impl OutboxEventKind {
    /// Lower value = drained first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::PoiBatch => 0,
            Self::DirectoryFinding => 1,
            Self::RelationshipFinding => 2,
        }
    }
}

/// Durable hand-off record from analysis to the queue bus (§3). A row exists
/// from write until the publisher drains it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: OutboxEventId,
    pub kind: OutboxEventKind,
    pub payload: serde_json::Value,
    pub run_id: RunId,
    pub published_at: Option<DateTime<Utc>>,
}

impl OutboxEvent {
    pub fn new(kind: OutboxEventKind, payload: serde_json::Value, run_id: RunId) -> Self {
        Self {
            id: OutboxEventId::generate(),
            kind,
            payload,
            run_id,
            published_at: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}
