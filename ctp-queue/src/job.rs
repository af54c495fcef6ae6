use std::time::Instant;

use ctp_core::types::identifiers::JobId;

/// The nine named FIFO queues (§4.1), in the order the pipeline drains
/// them producer-to-consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueName {
    FileAnalysis,
    DirectoryAggregation,
    DirectoryResolution,
    RelationshipResolution,
    Reconciliation,
    AnalysisFindings,
    GlobalResolution,
    RelationshipValidated,
    FailedJobs,
}

impl QueueName {
    pub const ALL: [QueueName; 9] = [
        Self::FileAnalysis,
        Self::DirectoryAggregation,
        Self::DirectoryResolution,
        Self::RelationshipResolution,
        Self::Reconciliation,
        Self::AnalysisFindings,
        Self::GlobalResolution,
        Self::RelationshipValidated,
        Self::FailedJobs,
    ];

    /// Reconciliation tolerates 10 consecutive failures before its breaker
    /// opens; every other queue uses the default of 5 (§4.1, §6).
    pub fn breaker_fail_limit(&self, default: u32, reconciliation: u32) -> u32 {
        if matches!(self, Self::Reconciliation) {
            reconciliation
        } else {
            default
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Active,
    Completed,
    Failed,
}

/// A retry policy applied on `fail` (§4.1): exponential back-off with a
/// max retry count.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn backoff_for(&self, attempt: u32) -> std::time::Duration {
        std::time::Duration::from_millis(self.base_backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_backoff_ms: 1000 }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub queue: QueueName,
    pub payload: serde_json::Value,
    pub dedupe_key: Option<String>,
    pub state: JobState,
    pub attempts: u32,
    pub reserved_at: Option<Instant>,
    pub last_failure_reason: Option<String>,
}

impl Job {
    pub fn new(queue: QueueName, payload: serde_json::Value, dedupe_key: Option<String>) -> Self {
        Self {
            id: JobId::generate(),
            queue,
            payload,
            dedupe_key,
            state: JobState::Waiting,
            attempts: 0,
            reserved_at: None,
            last_failure_reason: None,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}
