//! The §7 error taxonomy: every error in the pipeline is bucketed into one
//! of these six kinds for the run report and propagation policy.

use serde::{Deserialize, Serialize};

/// One of the six error buckets from §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorTaxonomy {
    /// Network, timeout, breaker open. Retried with back-off.
    Transient,
    /// Invariant I1–I7 broken. Fatal for graph build; one automated repair attempted.
    Integrity,
    /// Malformed input (missing `from`/`to`). Dropped with a structured log.
    Contract,
    /// Memory, disk, LLM quota. Triggers scale-down; breaker opens if persistent.
    Resource,
    /// Triangulation unable to reach consensus after retries.
    ConsensusFailure,
    /// Missing/invalid configuration at startup. Fatal, exit before any worker starts.
    Config,
}

impl ErrorTaxonomy {
    /// Whether an error of this kind should be retried locally rather than
    /// surfaced to the orchestrator (§7 propagation policy).
    pub fn absorbed_locally(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Whether this kind ever aborts the whole pipeline.
    pub fn can_be_fatal(&self) -> bool {
        matches!(self, Self::Integrity | Self::Config)
    }
}

/// Context every error in the pipeline carries, per §7: `{run_id, job_id?, component, recoverable}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub run_id: Option<String>,
    pub job_id: Option<String>,
    pub component: String,
    pub recoverable: bool,
    pub taxonomy: ErrorTaxonomy,
}

impl ErrorContext {
    pub fn new(component: impl Into<String>, taxonomy: ErrorTaxonomy, recoverable: bool) -> Self {
        Self {
            run_id: None,
            job_id: None,
            component: component.into(),
            recoverable,
            taxonomy,
        }
    }

    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}
