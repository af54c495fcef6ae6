//! Queue bus / worker pool errors (§4.1, §4.6).

use super::error_code::{self, CtpErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue not found: {queue}")]
    QueueNotFound { queue: String },

    #[error("job not found: {job_id}")]
    JobNotFound { job_id: String },

    #[error("circuit breaker open for {component} (cool-down {cooldown_secs}s remaining)")]
    BreakerOpen {
        component: String,
        cooldown_secs: u64,
    },

    #[error("global LLM concurrency cap ({cap}) exceeded")]
    ConcurrencyCapExceeded { cap: usize },

    #[error("job {job_id} exceeded max_job_time and was reclaimed")]
    JobTimedOut { job_id: String },

    #[error("pipeline cancelled")]
    Cancelled,
}

impl CtpErrorCode for QueueError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::QueueNotFound { .. } => error_code::QUEUE_NOT_FOUND,
            Self::JobNotFound { .. } => error_code::JOB_NOT_FOUND,
            Self::BreakerOpen { .. } => error_code::BREAKER_OPEN,
            Self::ConcurrencyCapExceeded { .. } => error_code::CONCURRENCY_CAP_EXCEEDED,
            _ => error_code::QUEUE_NOT_FOUND,
        }
    }
}
