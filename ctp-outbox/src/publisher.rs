//! Transactional outbox publisher (§4.2): the sole writer from analysis
//! results onto the queue bus.

use std::sync::Arc;

use ctp_confidence::{score, ScoringInput};
use ctp_core::errors::CtpError;
use ctp_core::traits::PipelineStorage;
use ctp_core::types::identifiers::{EvidenceId, RelationshipId, RunId};
use ctp_core::types::{
    compute_evidence_hash, EvidencePayload, OutboxEvent, OutboxEventKind, Relationship,
    RelationshipEvidence, RelationshipStatus, TriangulationSession,
};
use ctp_queue::{QueueBus, QueueName};

use crate::payloads::{DirectoryFindingPayload, PoiBatchPayload, RelationshipFindingPayload};

/// Drains the outbox in priority order: POI batches first, directory
/// findings second, relationship findings last.
const PRIORITY_ORDER: [&str; 3] = ["poi-batch", "directory-finding", "relationship-finding"];

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DrainReport {
    pub published: usize,
    pub relationships_created: usize,
    pub sessions_emitted: usize,
    pub contract_violations: usize,
}

pub struct OutboxPublisher {
    storage: Arc<dyn PipelineStorage>,
    bus: Arc<QueueBus>,
    batch_size: usize,
    low_confidence_threshold: f64,
}

impl OutboxPublisher {
    pub fn new(
        storage: Arc<dyn PipelineStorage>,
        bus: Arc<QueueBus>,
        batch_size: usize,
        low_confidence_threshold: f64,
    ) -> Self {
        Self { storage, bus, batch_size, low_confidence_threshold }
    }

    /// Drain up to `batch_size` events for `run_id`. Each event is read,
    /// transformed, enqueued, and marked published individually; a failure
    /// transforming one event leaves it unpublished and stops that event's
    /// processing without touching the rest of the batch (§4.2: "if the
    /// enqueue fails, the transaction aborts and the row remains unpublished").
    pub fn drain_once(&self, run_id: &RunId) -> Result<DrainReport, CtpError> {
        let events = self.storage.pending_outbox_events(&PRIORITY_ORDER, self.batch_size)?;
        let mut report = DrainReport::default();

        for event in events {
            if event.run_id != *run_id {
                continue;
            }
            let outcome = match event.kind {
                OutboxEventKind::PoiBatch => self.publish_poi_batch(&event),
                OutboxEventKind::DirectoryFinding => self.publish_directory_finding(&event),
                OutboxEventKind::RelationshipFinding => self.publish_relationship_finding(&event, &mut report),
            };

            match outcome {
                Ok(()) => {
                    self.storage.mark_outbox_published(event.id.as_str())?;
                    report.published += 1;
                }
                Err(CtpError::Contract(reason)) => {
                    tracing::warn!(event_id = %event.id, %reason, "dropping contract-invalid outbox event");
                    report.contract_violations += 1;
                }
                Err(other) => return Err(other),
            }
        }

        Ok(report)
    }

    fn publish_poi_batch(&self, event: &OutboxEvent) -> Result<(), CtpError> {
        let payload: PoiBatchPayload = serde_json::from_value(event.payload.clone())
            .map_err(|e| CtpError::Contract(format!("malformed poi-batch payload: {e}")))?;
        self.bus.enqueue(
            QueueName::DirectoryAggregation,
            serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null),
            Some(format!("poi-batch:{}", event.id.as_str())),
        );
        Ok(())
    }

    fn publish_directory_finding(&self, event: &OutboxEvent) -> Result<(), CtpError> {
        let payload: DirectoryFindingPayload = serde_json::from_value(event.payload.clone())
            .map_err(|e| CtpError::Contract(format!("malformed directory-finding payload: {e}")))?;
        self.bus.enqueue(
            QueueName::DirectoryResolution,
            serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null),
            Some(format!("directory-finding:{}", event.id.as_str())),
        );
        Ok(())
    }

    fn publish_relationship_finding(&self, event: &OutboxEvent, report: &mut DrainReport) -> Result<(), CtpError> {
        let payload: RelationshipFindingPayload = serde_json::from_value(event.payload.clone())
            .map_err(|e| CtpError::Contract(format!("malformed relationship-finding payload: {e}")))?;

        let run_id_str = event.run_id.as_str();
        let source = self
            .storage
            .find_poi_by_semantic_id(run_id_str, &payload.from_semantic_id)?
            .ok_or_else(|| CtpError::Contract(format!("unknown source POI {}", payload.from_semantic_id)))?;
        let target = self
            .storage
            .find_poi_by_semantic_id(run_id_str, &payload.to_semantic_id)?
            .ok_or_else(|| CtpError::Contract(format!("unknown target POI {}", payload.to_semantic_id)))?;

        let evidence_hash = compute_evidence_hash(&payload.from_semantic_id, &payload.to_semantic_id, payload.relationship_type);

        let relationship = match self.storage.find_relationship_by_evidence_hash(run_id_str, &evidence_hash)? {
            Some(existing) => existing,
            None => {
                let scored = score(&ScoringInput {
                    relationship_type: payload.relationship_type,
                    reason: &payload.reason,
                    evidence_items: payload.evidence_items,
                });
                let relationship = Relationship {
                    id: RelationshipId::generate(),
                    run_id: event.run_id.clone(),
                    source_poi_id: source.id.clone(),
                    target_poi_id: target.id.clone(),
                    relationship_type: payload.relationship_type,
                    confidence: scored,
                    status: RelationshipStatus::Pending,
                    reason: payload.reason.clone(),
                    evidence_hash: evidence_hash.clone(),
                };
                self.storage.upsert_relationship(&relationship)?;
                report.relationships_created += 1;

                if scored < self.low_confidence_threshold {
                    let session = TriangulationSession::open(relationship.id.clone());
                    self.storage.upsert_session(&session)?;
                    report.sessions_emitted += 1;
                }
                relationship
            }
        };

        self.storage.insert_evidence(&RelationshipEvidence {
            id: EvidenceId::generate(),
            relationship_id: relationship.id.clone(),
            relationship_hash: evidence_hash,
            payload: EvidencePayload {
                from: payload.from_semantic_id.clone(),
                to: payload.to_semantic_id.clone(),
                relationship_type: payload.relationship_type,
                confidence: relationship.confidence,
                reason: payload.reason.clone(),
                source_mode: payload.source_mode,
            },
            run_id: event.run_id.clone(),
        })?;

        self.bus.enqueue(
            QueueName::RelationshipResolution,
            serde_json::json!({ "relationship_id": relationship.id.as_str() }),
            Some(format!("relationship-finding:{}", event.id.as_str())),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_core::types::identifiers::PoiId;
    use ctp_core::types::{Poi, PoiType, Run, SourceMode};
    use ctp_storage::SqliteStorage;
    use std::time::Duration;

    fn setup() -> (Arc<dyn PipelineStorage>, Arc<QueueBus>, RunId) {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        storage.initialize().unwrap();
        let run = Run::start("/repo");
        let run_id = run.id.clone();
        storage.insert_run(&run).unwrap();

        let source = Poi {
            id: PoiId::generate(),
            file_id: ctp_core::types::identifiers::FileId::generate(),
            run_id: run_id.clone(),
            semantic_id: "a.rs".to_string(),
            name: "a".to_string(),
            poi_type: PoiType::File,
            start_line: 1,
            end_line: 1,
            description: String::new(),
        };
        let target = Poi { semantic_id: "b.rs".to_string(), name: "b".to_string(), ..source.clone() };
        storage.upsert_poi(&source).unwrap();
        storage.upsert_poi(&target).unwrap();

        let bus = Arc::new(QueueBus::new(10, Duration::from_secs(120), Default::default()));
        (storage, bus, run_id)
    }

    #[test]
    fn relationship_finding_creates_pending_relationship_and_enqueues() {
        let (storage, bus, run_id) = setup();
        let event = OutboxEvent::new(
            OutboxEventKind::RelationshipFinding,
            serde_json::to_value(RelationshipFindingPayload {
                from_semantic_id: "a.rs".to_string(),
                to_semantic_id: "b.rs".to_string(),
                relationship_type: ctp_core::types::RelationshipType::Calls,
                reason: "a directly invokes b at startup".to_string(),
                evidence_items: 2,
                source_mode: SourceMode::Batch,
            })
            .unwrap(),
            run_id.clone(),
        );
        storage.insert_outbox_event(&event).unwrap();

        let publisher = OutboxPublisher::new(storage.clone(), bus.clone(), 100, 0.4);
        let report = publisher.drain_once(&run_id).unwrap();

        assert_eq!(report.published, 1);
        assert_eq!(report.relationships_created, 1);
        assert_eq!(bus.stats(QueueName::RelationshipResolution).waiting, 1);
    }

    #[test]
    fn low_confidence_relationship_emits_triangulation_session() {
        let (storage, bus, run_id) = setup();
        let event = OutboxEvent::new(
            OutboxEventKind::RelationshipFinding,
            serde_json::to_value(RelationshipFindingPayload {
                from_semantic_id: "a.rs".to_string(),
                to_semantic_id: "b.rs".to_string(),
                relationship_type: ctp_core::types::RelationshipType::Uses,
                reason: "x".to_string(),
                evidence_items: 0,
                source_mode: SourceMode::Batch,
            })
            .unwrap(),
            run_id.clone(),
        );
        storage.insert_outbox_event(&event).unwrap();

        let publisher = OutboxPublisher::new(storage, bus, 100, 0.9);
        let report = publisher.drain_once(&run_id).unwrap();
        assert_eq!(report.sessions_emitted, 1);
    }

    #[test]
    fn missing_endpoint_poi_is_a_contract_violation() {
        let (storage, bus, run_id) = setup();
        let event = OutboxEvent::new(
            OutboxEventKind::RelationshipFinding,
            serde_json::to_value(RelationshipFindingPayload {
                from_semantic_id: "missing.rs".to_string(),
                to_semantic_id: "b.rs".to_string(),
                relationship_type: ctp_core::types::RelationshipType::Uses,
                reason: "x".to_string(),
                evidence_items: 0,
                source_mode: SourceMode::Batch,
            })
            .unwrap(),
            run_id.clone(),
        );
        storage.insert_outbox_event(&event).unwrap();

        let publisher = OutboxPublisher::new(storage, bus, 100, 0.4);
        let report = publisher.drain_once(&run_id).unwrap();
        assert_eq!(report.contract_violations, 1);
        assert_eq!(report.published, 0);
    }
}
