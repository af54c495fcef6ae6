//! Top-level error type the pipeline binary and run report deal in.

use super::error_code::{self, CtpErrorCode};
use super::queue_error::QueueError;
use super::storage_error::StorageError;
use super::taxonomy::ErrorTaxonomy;

#[derive(Debug, thiserror::Error)]
pub enum CtpError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("contract violation: {0}")]
    Contract(String),

    #[error("consensus failure: {0}")]
    ConsensusFailure(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("resource exhausted: {0}")]
    Resource(String),

    #[error("external dependency unreachable: {0}")]
    DependencyUnreachable(String),
}

impl CtpError {
    /// Which §7 taxonomy bucket this error belongs to, for the run report.
    pub fn taxonomy(&self) -> ErrorTaxonomy {
        match self {
            Self::Storage(e) => match e {
                StorageError::DbBusy | StorageError::ConnectionPoolExhausted { .. } => {
                    ErrorTaxonomy::Transient
                }
                StorageError::DiskFull => ErrorTaxonomy::Resource,
                _ => ErrorTaxonomy::Integrity,
            },
            Self::Queue(e) => match e {
                QueueError::BreakerOpen { .. } | QueueError::JobTimedOut { .. } => {
                    ErrorTaxonomy::Transient
                }
                QueueError::ConcurrencyCapExceeded { .. } => ErrorTaxonomy::Resource,
                _ => ErrorTaxonomy::Contract,
            },
            Self::Integrity(_) => ErrorTaxonomy::Integrity,
            Self::Contract(_) => ErrorTaxonomy::Contract,
            Self::ConsensusFailure(_) => ErrorTaxonomy::ConsensusFailure,
            Self::Config(_) => ErrorTaxonomy::Config,
            Self::Resource(_) => ErrorTaxonomy::Resource,
            Self::DependencyUnreachable(_) => ErrorTaxonomy::Transient,
        }
    }

    /// Process exit code per §6: 0 success; 1 integrity-gate fatal;
    /// 2 pipeline cancelled; 3 external-dependency unreachable.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Integrity(_) => 1,
            Self::Queue(QueueError::Cancelled) => 2,
            Self::DependencyUnreachable(_) => 3,
            _ => 1,
        }
    }
}

impl CtpErrorCode for CtpError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Queue(e) => e.error_code(),
            Self::Integrity(_) => error_code::INTEGRITY_VIOLATION,
            Self::Contract(_) => error_code::CONTRACT_VIOLATION,
            Self::ConsensusFailure(_) => error_code::CONSENSUS_FAILURE,
            Self::Config(_) => error_code::CONFIG_INVALID,
            Self::Resource(_) => error_code::RESOURCE_EXHAUSTED,
            Self::DependencyUnreachable(_) => error_code::STORAGE_ERROR,
        }
    }
}
