//! `RunReport` (§6): the JSON summary one pipeline run produces, combining
//! storage stats, per-queue throughput, the outbox drain, the integrity
//! gate and graph-build outcomes, validation cache/history size, and the
//! post-run health snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ctp_core::errors::CtpError;
use ctp_core::telemetry::PipelineHealth;
use ctp_core::traits::{PipelineStorage, StorageStats};
use ctp_core::types::{RelationshipStatus, Run};
use ctp_graph::{BuildReport, IntegrityReport};
use ctp_outbox::DrainReport;
use ctp_queue::{QueueBus, QueueName, QueueStats};
use ctp_validation::ValidationPipeline;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelationshipCounts {
    pub pending: usize,
    pub validated: usize,
    pub discarded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub name: QueueName,
    pub stats: QueueStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub target_root: String,
    pub started_at: DateTime<Utc>,
    pub sealed_at: Option<DateTime<Utc>>,
    pub storage: StorageStats,
    pub relationship_counts: RelationshipCounts,
    pub queues: Vec<QueueSnapshot>,
    pub outbox: DrainReport,
    pub integrity: IntegrityReport,
    pub graph: BuildReport,
    pub health: PipelineHealth,
    pub validation_cache_size: u64,
    pub validation_history_len: usize,
    pub exit_code: i32,
}

impl RunReport {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        run: &Run,
        storage: &dyn PipelineStorage,
        bus: &QueueBus,
        integrity: &IntegrityReport,
        graph: &BuildReport,
        health: &PipelineHealth,
        validation: &ValidationPipeline,
        outbox: DrainReport,
    ) -> Result<Self, CtpError> {
        let storage_stats = storage.stats(run.id.as_str())?;

        let mut counts = RelationshipCounts::default();
        counts.pending = storage.relationships_by_status(run.id.as_str(), RelationshipStatus::Pending)?.len();
        counts.validated = storage.relationships_by_status(run.id.as_str(), RelationshipStatus::Validated)?.len();
        counts.discarded = storage.relationships_by_status(run.id.as_str(), RelationshipStatus::Discarded)?.len();
        counts.failed = storage.relationships_by_status(run.id.as_str(), RelationshipStatus::Failed)?.len();

        let queues = QueueName::ALL.into_iter().map(|name| QueueSnapshot { name, stats: bus.stats(name) }).collect();

        let sealed_run = storage.get_run(run.id.as_str())?;

        Ok(Self {
            run_id: run.id.as_str().to_string(),
            target_root: run.target_root.clone(),
            started_at: run.started_at,
            sealed_at: sealed_run.and_then(|r| r.sealed_at),
            storage: storage_stats,
            relationship_counts: counts,
            queues,
            outbox,
            integrity: integrity.clone(),
            graph: graph.clone(),
            health: health.clone(),
            validation_cache_size: validation.cache_size(),
            validation_history_len: validation.history_len(),
            exit_code: 0,
        })
    }
}
