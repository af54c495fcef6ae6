//! End-to-end wiring for one pipeline run (§4, §5): ingest → outbox drain →
//! relationship resolution (triangulation where confidence is low) →
//! advanced validation → integrity gate → graph build → seal.
//!
//! This is the "single-node run mode" SPEC_FULL.md §4 sanctions: one
//! process drives every stage directly instead of a dynamically-scaled
//! fleet of worker threads per queue. The `QueueBus` is still the real
//! mechanism for `file-analysis` and `relationship-resolution` — jobs are
//! reserved and acked/failed exactly as a worker would, just from a single
//! driving loop rather than `N` pooled threads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{info, warn};

use ctp_confidence::{CancellationToken, TriangulationContext, TriangulationOrchestrator, TriangulationOutcome};
use ctp_core::errors::CtpError;
use ctp_core::telemetry::{DegradationTracker, MetricsCollector, PipelineHealth};
use ctp_core::traits::{FileWalker, LlmClient, PipelineStorage, PropertyGraph};
use ctp_core::types::identifiers::{FileId, PoiId};
use ctp_core::types::{
    OutboxEvent, OutboxEventKind, Poi, Relationship, RelationshipStatus, Run, SourceFile, SourceMode,
};
use ctp_outbox::{OutboxPublisher, PoiBatchPayload, RelationshipFindingPayload};
use ctp_queue::{Admission, CircuitBreaker, Job, QueueBus, QueueName, RetryPolicy};
use ctp_validation::{RelationshipCandidate, Scope, ValidationPipeline};

use ctp_core::config::PipelineConfig;

use crate::extraction::{analyze_file, drain_walker};
use crate::health;
use crate::report::RunReport;

pub struct Orchestrator {
    storage: Arc<dyn PipelineStorage>,
    bus: Arc<QueueBus>,
    outbox: OutboxPublisher,
    graph: Arc<dyn PropertyGraph>,
    llm: Arc<dyn LlmClient>,
    validation: ValidationPipeline,
    triangulation: TriangulationOrchestrator,
    config: PipelineConfig,
    metrics: Arc<MetricsCollector>,
    degradation: Mutex<DegradationTracker>,
    breaker_llm: CircuitBreaker,
    breaker_graph: CircuitBreaker,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        storage: Arc<dyn PipelineStorage>,
        graph: Arc<dyn PropertyGraph>,
        llm: Arc<dyn LlmClient>,
        config: PipelineConfig,
    ) -> Self {
        let bus = Arc::new(QueueBus::new(
            config.effective_global_llm_concurrency(),
            std::time::Duration::from_secs(config.effective_max_job_time_secs()),
            RetryPolicy { max_retries: config.effective_worker_retries(), base_backoff_ms: 1000 },
        ));
        let outbox = OutboxPublisher::new(
            storage.clone(),
            bus.clone(),
            config.effective_outbox_batch(),
            config.effective_low_confidence_threshold(),
        );
        let triangulation = TriangulationOrchestrator::new(
            llm.clone(),
            config.effective_triangulation_parallelism(),
            config.effective_worker_retries(),
        );
        Self {
            storage,
            bus,
            outbox,
            graph,
            llm,
            validation: ValidationPipeline::new(config.effective_escalation_threshold()),
            triangulation,
            breaker_llm: CircuitBreaker::new(
                "llm_client",
                config.effective_breaker_fail_limit(),
                std::time::Duration::from_secs(config.effective_breaker_cooldown_secs()),
            ),
            breaker_graph: CircuitBreaker::new(
                "graph_store",
                config.effective_breaker_fail_limit(),
                std::time::Duration::from_secs(config.effective_breaker_cooldown_secs()),
            ),
            config,
            metrics: Arc::new(MetricsCollector::new()),
            degradation: Mutex::new(DegradationTracker::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Run the full pipeline over every file `walker` produces. Never
    /// panics on a single file's extraction failure — those are logged and
    /// skipped; only storage/config errors abort the whole run.
    pub async fn run(&self, target_root: &str, walker: &mut dyn FileWalker) -> Result<RunReport, CtpError> {
        self.storage.initialize()?;

        let run = Run::start(target_root);
        self.storage.insert_run(&run)?;
        info!(run_id = %run.id, %target_root, "run started");

        let files = drain_walker(walker)?;
        for file in &files {
            self.bus.enqueue(
                QueueName::FileAnalysis,
                serde_json::json!({
                    "path": file.path,
                    "content_hash": file.content_hash,
                    "size_bytes": file.size_bytes,
                }),
                Some(format!("file:{}", file.content_hash)),
            );
        }

        while let Some(job) = self.bus.reserve(QueueName::FileAnalysis) {
            match self.ingest_file(&run, &job).await {
                Ok(()) => {
                    self.bus.ack(&job.id)?;
                    self.metrics.incr("files.analyzed", 1);
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "file analysis failed");
                    self.bus.fail(&job.id, e.to_string())?;
                    self.metrics.incr("files.failed", 1);
                }
            }
        }

        let mut drain_total = ctp_outbox::DrainReport::default();
        loop {
            let batch = self.outbox.drain_once(&run.id)?;
            drain_total.published += batch.published;
            drain_total.relationships_created += batch.relationships_created;
            drain_total.sessions_emitted += batch.sessions_emitted;
            drain_total.contract_violations += batch.contract_violations;
            if batch.published == 0 {
                break;
            }
            if self.storage.stats(run.id.as_str())?.pending_outbox_count == 0 {
                break;
            }
        }
        info!(published = drain_total.published, violations = drain_total.contract_violations, "outbox drained");

        while let Some(job) = self.bus.reserve(QueueName::RelationshipResolution) {
            let relationship_id = job.payload.get("relationship_id").and_then(|v| v.as_str()).unwrap_or_default();
            match self.resolve_relationship(relationship_id).await {
                Ok(()) => self.bus.ack(&job.id)?,
                Err(e) => {
                    warn!(relationship_id, error = %e, "relationship resolution failed");
                    self.bus.fail(&job.id, e.to_string())?;
                }
            }
        }

        self.run_validation(&run)?;

        let integrity = ctp_graph::run_integrity_gate(self.storage.as_ref(), run.id.as_str())?;
        if integrity.has_violations() {
            warn!(?integrity, "integrity gate found and repaired violations");
        }

        let build_report = self.build_graph(&run)?;

        self.storage.seal_run(run.id.as_str())?;

        let health = health::check(
            self.storage.as_ref(),
            self.graph.as_ref(),
            &[("llm_client", &self.breaker_llm), ("graph_store", &self.breaker_graph)],
            Some(!integrity.has_violations()),
        );

        Ok(RunReport::build(
            &run,
            self.storage.as_ref(),
            &self.bus,
            &integrity,
            &build_report,
            &health,
            &self.validation,
            drain_total,
        )?)
    }

    async fn ingest_file(&self, run: &Run, job: &Job) -> Result<(), CtpError> {
        let path = job.payload["path"].as_str().unwrap_or_default().to_string();
        let content_hash = job.payload["content_hash"].as_str().unwrap_or_default().to_string();
        let size_bytes = job.payload["size_bytes"].as_u64().unwrap_or(0);
        let walked = ctp_core::traits::WalkedFile { path: path.clone(), content_hash: content_hash.clone(), size_bytes };

        self.storage.insert_file(&SourceFile {
            id: FileId::generate(),
            run_id: run.id.clone(),
            path: path.clone(),
            content_hash,
        })?;

        let extraction = self.call_llm_guarded(|| analyze_file(self.llm.as_ref(), &walked)).await?;

        let mut semantic_ids = HashMap::new();
        let mut pois = Vec::with_capacity(extraction.pois.len());
        for extracted in &extraction.pois {
            let semantic_id = extracted
                .semantic_id
                .clone()
                .unwrap_or_else(|| Poi::compute_semantic_id(extracted.poi_type, &extracted.name, &path, extracted.start_line));
            let poi = Poi {
                id: PoiId::generate(),
                file_id: FileId::generate(),
                run_id: run.id.clone(),
                semantic_id: semantic_id.clone(),
                name: extracted.name.clone(),
                poi_type: extracted.poi_type,
                start_line: extracted.start_line,
                end_line: extracted.end_line,
                description: extracted.description.clone(),
            };
            self.storage.upsert_poi(&poi)?;
            semantic_ids.insert(extracted.name.clone(), semantic_id);
            pois.push(poi);
        }

        if !pois.is_empty() {
            let payload = serde_json::to_value(PoiBatchPayload { pois })
                .map_err(|e| CtpError::Contract(format!("encoding poi-batch payload: {e}")))?;
            self.storage
                .insert_outbox_event(&OutboxEvent::new(OutboxEventKind::PoiBatch, payload, run.id.clone()))?;
        }

        for rel in &extraction.relationships {
            let from = semantic_ids.get(&rel.from).cloned().unwrap_or_else(|| rel.from.clone());
            let to = semantic_ids.get(&rel.to).cloned().unwrap_or_else(|| rel.to.clone());
            let payload = serde_json::to_value(RelationshipFindingPayload {
                from_semantic_id: from,
                to_semantic_id: to,
                relationship_type: rel.relationship_type,
                reason: rel.reason.clone(),
                evidence_items: rel.evidence_items,
                source_mode: SourceMode::Batch,
            })
            .map_err(|e| CtpError::Contract(format!("encoding relationship-finding payload: {e}")))?;
            self.storage
                .insert_outbox_event(&OutboxEvent::new(OutboxEventKind::RelationshipFinding, payload, run.id.clone()))?;
        }

        Ok(())
    }

    async fn resolve_relationship(&self, relationship_id: &str) -> Result<(), CtpError> {
        let threshold = self.config.effective_low_confidence_threshold();
        let Some(relationship) = self.storage.get_relationship(relationship_id)? else {
            return Ok(());
        };
        if relationship.status != RelationshipStatus::Pending || relationship.confidence >= threshold {
            return Ok(());
        }

        let mut session = match self.storage.find_open_session_for_relationship(relationship_id)? {
            Some(session) => session,
            None => ctp_core::types::TriangulationSession::open(relationship.id.clone()),
        };
        let ctx = self.triangulation_context(&relationship)?;

        let mut attempt = 1;
        loop {
            if self.breaker_llm.try_admit() == Admission::Rejected {
                self.storage.upsert_session(&session)?;
                return Ok(());
            }

            let outcome = self
                .call_llm_guarded(|| self.triangulation.run(&mut session, &ctx, attempt, &self.cancel))
                .await?;

            match outcome {
                TriangulationOutcome::Completed { final_confidence, analyses, .. } => {
                    self.storage.set_relationship_status(relationship_id, RelationshipStatus::Pending, Some(final_confidence))?;
                    self.storage.upsert_session(&session)?;
                    for analysis in analyses {
                        self.storage.insert_sub_agent_analysis(&analysis)?;
                    }
                    return Ok(());
                }
                TriangulationOutcome::Failed { analyses, .. } => {
                    self.storage.set_relationship_status(relationship_id, RelationshipStatus::Discarded, None)?;
                    self.storage.upsert_session(&session)?;
                    for analysis in analyses {
                        self.storage.insert_sub_agent_analysis(&analysis)?;
                    }
                    return Ok(());
                }
                TriangulationOutcome::Requeue { .. } => {
                    attempt += 1;
                    continue;
                }
                TriangulationOutcome::Cancelled => {
                    self.storage.upsert_session(&session)?;
                    return Ok(());
                }
            }
        }
    }

    fn triangulation_context(&self, relationship: &Relationship) -> Result<TriangulationContext, CtpError> {
        let run_id = relationship.run_id.as_str();
        let source = self.storage.get_poi(run_id, relationship.source_poi_id.as_str())?;
        let target = self.storage.get_poi(run_id, relationship.target_poi_id.as_str())?;
        Ok(TriangulationContext {
            from_description: source.map(describe).unwrap_or_default(),
            to_description: target.map(describe).unwrap_or_default(),
            relationship_type: relationship.relationship_type,
            reason: relationship.reason.clone(),
        })
    }

    fn run_validation(&self, run: &Run) -> Result<(), CtpError> {
        let pending = self.storage.relationships_by_status(run.id.as_str(), RelationshipStatus::Pending)?;
        let mut descriptions = HashMap::new();
        let mut by_semantic_key: HashMap<String, Vec<&str>> = HashMap::new();
        let mut candidates = Vec::with_capacity(pending.len());

        for rel in &pending {
            let source = self.storage.get_poi(run.id.as_str(), rel.source_poi_id.as_str())?;
            let target = self.storage.get_poi(run.id.as_str(), rel.target_poi_id.as_str())?;
            let (Some(source), Some(target)) = (source, target) else { continue };
            if !source.description.is_empty() {
                descriptions.insert(source.semantic_id.clone(), source.description.clone());
            }
            if !target.description.is_empty() {
                descriptions.insert(target.semantic_id.clone(), target.description.clone());
            }
            let scope = if source.file_id == target.file_id { Scope::File } else { Scope::CrossFile };
            let candidate = RelationshipCandidate {
                relationship_id: rel.id.clone(),
                from: source.semantic_id.clone(),
                to: target.semantic_id.clone(),
                relationship_type: rel.relationship_type,
                confidence: rel.confidence,
                scope,
                source_mode: SourceMode::Batch,
                observed_at: chrono::Utc::now(),
                priority: rel.confidence,
            };
            by_semantic_key.entry(candidate.semantic_key()).or_default().push(rel.id.as_str());
            candidates.push(candidate);
        }

        let outcomes = self.validation.validate(candidates, &descriptions);
        for outcome in &outcomes {
            if let Some(resolution) = &outcome.resolution {
                self.apply_decision(resolution.selected.as_str(), outcome.decision, outcome.confidence)?;
                for rejected in &resolution.rejected {
                    self.storage.set_relationship_status(rejected.as_str(), RelationshipStatus::Discarded, None)?;
                }
            } else if let Some(ids) = by_semantic_key.get(&outcome.semantic_key) {
                for id in ids {
                    self.apply_decision(id, outcome.decision, outcome.confidence)?;
                }
            }
        }
        Ok(())
    }

    fn apply_decision(&self, relationship_id: &str, decision: ctp_validation::Decision, confidence: f64) -> Result<(), CtpError> {
        use ctp_validation::Decision;
        match decision {
            Decision::Accept => {
                self.storage.set_relationship_status(relationship_id, RelationshipStatus::Validated, Some(confidence))?;
            }
            Decision::Reject => {
                self.storage.set_relationship_status(relationship_id, RelationshipStatus::Discarded, Some(confidence))?;
            }
            // Escalated relationships stay PENDING awaiting human review; only
            // their confidence is refreshed from the resolution/decision pass.
            Decision::Escalate => {
                self.storage.set_relationship_status(relationship_id, RelationshipStatus::Pending, Some(confidence))?;
            }
        }
        Ok(())
    }

    fn build_graph(&self, run: &Run) -> Result<ctp_graph::BuildReport, CtpError> {
        if self.breaker_graph.try_admit() == Admission::Rejected {
            warn!("graph build skipped: breaker open");
            return Ok(ctp_graph::BuildReport::default());
        }
        let started = Instant::now();
        let result = ctp_graph::build_graph(self.storage.as_ref(), self.graph.as_ref(), run.id.as_str());
        self.metrics.observe_duration_us("graph.build", started.elapsed().as_micros() as u64);
        match &result {
            Ok(_) => self.breaker_graph.record_success(),
            Err(_) => self.breaker_graph.record_failure(),
        }
        result
    }

    async fn call_llm_guarded<F, Fut, T>(&self, call: F) -> Result<T, CtpError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, CtpError>>,
    {
        let permit = self.bus.llm_gate.acquire();
        if self.breaker_llm.try_admit() == Admission::Rejected {
            drop(permit);
            return Err(CtpError::DependencyUnreachable("llm_client breaker open".to_string()));
        }
        let result = call().await;
        drop(permit);
        match &result {
            Ok(_) => {
                self.breaker_llm.record_success();
                self.degradation.lock().unwrap().record_success("llm_client");
            }
            Err(_) => {
                self.breaker_llm.record_failure();
                self.degradation.lock().unwrap().record_failure("llm_client");
            }
        }
        result
    }
}

fn describe(poi: Poi) -> String {
    if poi.description.is_empty() {
        format!("{} `{}`", poi.poi_type.as_str(), poi.name)
    } else {
        poi.description
    }
}

pub fn health_snapshot(
    storage: &dyn PipelineStorage,
    graph: &dyn PropertyGraph,
    breakers: &[(&'static str, &CircuitBreaker)],
    integrity_clean: Option<bool>,
) -> PipelineHealth {
    health::check(storage, graph, breakers, integrity_clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_storage::SqliteStorage;
    use ctp_testkit::{FakeLlmClient, FakeWalker, InMemoryGraph};

    fn extraction_response() -> String {
        r#"{"pois":[
              {"name":"main","poi_type":"function","start_line":1,"end_line":5},
              {"name":"helper","poi_type":"function","start_line":7,"end_line":10}
           ],
           "relationships":[
              {"from":"main","to":"helper","relationship_type":"CALLS","reason":"main directly calls helper at startup","evidence_items":2}
           ]}"#
            .to_string()
    }

    #[tokio::test]
    async fn single_file_two_functions_yields_a_validated_calls_relationship() {
        let storage: Arc<dyn PipelineStorage> = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let graph: Arc<dyn PropertyGraph> = Arc::new(InMemoryGraph::new());
        let llm: Arc<dyn LlmClient> = Arc::new(FakeLlmClient::always(extraction_response()));
        let orchestrator = Orchestrator::new(storage.clone(), graph.clone(), llm, PipelineConfig::default());

        let mut walker = FakeWalker::from_paths(&["src/main.rs"]);
        let report = orchestrator.run("/repo", &mut walker).await.unwrap();

        assert_eq!(report.relationship_counts.validated, 1);
        assert_eq!(graph.node_count().unwrap(), 2);
        assert_eq!(graph.edge_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_walker_produces_a_clean_empty_run() {
        let storage: Arc<dyn PipelineStorage> = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let graph: Arc<dyn PropertyGraph> = Arc::new(InMemoryGraph::new());
        let llm: Arc<dyn LlmClient> = Arc::new(FakeLlmClient::always("{}"));
        let orchestrator = Orchestrator::new(storage, graph, llm, PipelineConfig::default());

        let mut walker = FakeWalker::from_paths(&[]);
        let report = orchestrator.run("/repo", &mut walker).await.unwrap();

        assert_eq!(report.relationship_counts.validated, 0);
        assert!(!report.integrity.has_violations());
    }
}
