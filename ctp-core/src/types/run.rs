use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::RunId;

/// One invocation of the pipeline over a target tree (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub started_at: DateTime<Utc>,
    pub target_root: String,
    pub sealed_at: Option<DateTime<Utc>>,
}

impl Run {
    pub fn start(target_root: impl Into<String>) -> Self {
        Self {
            id: RunId::generate(),
            started_at: Utc::now(),
            target_root: target_root.into(),
            sealed_at: None,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed_at.is_some()
    }
}

/// One source file under a run (§3). Created on walker emission, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: super::identifiers::FileId,
    pub run_id: RunId,
    pub path: String,
    pub content_hash: String,
}
