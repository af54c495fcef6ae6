//! `QueueBus` — nine named FIFO queues with durable job state, backed by
//! per-queue `Mutex<VecDeque<Job>>` (dashmap gives lock-free access across
//! queues; each queue's own deque is still serialized, matching the
//! "single writer per invariant" discipline of §5).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use ctp_core::errors::QueueError;
use ctp_core::types::identifiers::JobId;

use crate::concurrency::ConcurrencyGate;
use crate::job::{Job, JobState, QueueName, QueueStats, RetryPolicy};
use crate::scaling::{evaluate, QueueConcurrency, ResourceBudget};

struct QueueCounters {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl Default for QueueCounters {
    fn default() -> Self {
        Self { completed: AtomicUsize::new(0), failed: AtomicUsize::new(0) }
    }
}

pub struct QueueBus {
    waiting: DashMap<QueueName, Mutex<VecDeque<Job>>>,
    active: DashMap<JobId, Job>,
    dedupe_index: DashMap<String, JobId>,
    counters: DashMap<QueueName, QueueCounters>,
    concurrency: DashMap<QueueName, Mutex<QueueConcurrency>>,
    pub llm_gate: Arc<ConcurrencyGate>,
    max_job_time: Duration,
    retry_policy: RetryPolicy,
}

impl QueueBus {
    pub fn new(global_llm_concurrency: usize, max_job_time: Duration, retry_policy: RetryPolicy) -> Self {
        let waiting = DashMap::new();
        let counters = DashMap::new();
        let concurrency = DashMap::new();
        for queue in QueueName::ALL {
            waiting.insert(queue, Mutex::new(VecDeque::new()));
            counters.insert(queue, QueueCounters::default());
            concurrency.insert(queue, Mutex::new(QueueConcurrency::new(2, 5)));
        }
        Self {
            waiting,
            active: DashMap::new(),
            dedupe_index: DashMap::new(),
            counters,
            concurrency,
            llm_gate: Arc::new(ConcurrencyGate::new(global_llm_concurrency)),
            max_job_time,
            retry_policy,
        }
    }

    /// Idempotent on `dedupe_key`: a second enqueue with the same key
    /// returns the original job's id without creating a duplicate.
    pub fn enqueue(&self, queue: QueueName, payload: serde_json::Value, dedupe_key: Option<String>) -> JobId {
        if let Some(key) = &dedupe_key {
            if let Some(existing) = self.dedupe_index.get(key) {
                return existing.clone();
            }
        }

        let job = Job::new(queue, payload, dedupe_key.clone());
        let id = job.id.clone();
        if let Some(key) = dedupe_key {
            self.dedupe_index.insert(key, id.clone());
        }
        self.waiting.get(&queue).unwrap().lock().unwrap().push_back(job);
        id
    }

    /// Pop the next waiting job for `queue`, if the queue's current
    /// concurrency allows another active job. Returns `None` rather than
    /// blocking if the per-queue slot is full; the global LLM gate's
    /// cooperative wait is a separate, caller-driven step via `llm_gate`.
    pub fn reserve(&self, queue: QueueName) -> Option<Job> {
        let active_count = self.active.iter().filter(|e| e.value().queue == queue).count();
        let current_cap = self.concurrency.get(&queue)?.lock().unwrap().current;
        if active_count >= current_cap {
            return None;
        }

        let mut deque = self.waiting.get(&queue)?.lock().unwrap();
        let mut job = deque.pop_front()?;
        job.state = JobState::Active;
        job.reserved_at = Some(Instant::now());
        self.active.insert(job.id.clone(), job.clone());
        Some(job)
    }

    pub fn ack(&self, job_id: &JobId) -> Result<(), QueueError> {
        let (_, job) = self
            .active
            .remove(job_id)
            .ok_or_else(|| QueueError::JobNotFound { job_id: job_id.as_str().to_string() })?;
        self.counters.get(&job.queue).unwrap().completed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// On failure: requeue with back-off up to `WORKER_RETRIES`, else move
    /// to `failed-jobs` terminally (§4.1, §7 TRANSIENT).
    pub fn fail(&self, job_id: &JobId, reason: impl Into<String>) -> Result<(), QueueError> {
        let (_, mut job) = self
            .active
            .remove(job_id)
            .ok_or_else(|| QueueError::JobNotFound { job_id: job_id.as_str().to_string() })?;

        job.attempts += 1;
        job.last_failure_reason = Some(reason.into());
        job.reserved_at = None;

        if job.attempts > self.retry_policy.max_retries {
            job.state = JobState::Failed;
            job.queue = QueueName::FailedJobs;
            self.counters.get(&job.queue).map(|c| c.failed.fetch_add(1, Ordering::Relaxed));
            self.waiting.get(&QueueName::FailedJobs).unwrap().lock().unwrap().push_back(job);
        } else {
            job.state = JobState::Waiting;
            let queue = job.queue;
            self.waiting.get(&queue).unwrap().lock().unwrap().push_back(job);
        }
        Ok(())
    }

    pub fn stats(&self, queue: QueueName) -> QueueStats {
        let waiting = self.waiting.get(&queue).map(|d| d.lock().unwrap().len()).unwrap_or(0);
        let active = self.active.iter().filter(|e| e.value().queue == queue).count();
        let counters = self.counters.get(&queue);
        QueueStats {
            waiting,
            active,
            completed: counters.as_ref().map(|c| c.completed.load(Ordering::Relaxed)).unwrap_or(0),
            failed: counters.as_ref().map(|c| c.failed.load(Ordering::Relaxed)).unwrap_or(0),
        }
    }

    /// Run one scaling tick for every queue (§4.1 scaling algorithm).
    pub fn scale_tick(&self, budget: ResourceBudget) {
        for queue in QueueName::ALL {
            let active = self.active.iter().filter(|e| e.value().queue == queue).count();
            let waiting = self.waiting.get(&queue).map(|d| d.lock().unwrap().len()).unwrap_or(0);
            let mut slot = self.concurrency.get(&queue).unwrap().lock().unwrap();
            *slot = evaluate(*slot, active, waiting, budget);
        }
    }

    /// Reclaim reservations held past `max_job_time` without ack/fail
    /// (§4.1 sweeper, run every 60 s in production).
    pub fn sweep_leaked_reservations(&self) -> usize {
        let now = Instant::now();
        let leaked: Vec<JobId> = self
            .active
            .iter()
            .filter(|e| e.value().reserved_at.map(|t| now.duration_since(t) >= self.max_job_time).unwrap_or(false))
            .map(|e| e.key().clone())
            .collect();

        for job_id in &leaked {
            let _ = self.fail(job_id, "leaked reservation reclaimed by sweeper");
        }
        leaked.len()
    }

    pub fn queue_concurrency(&self, queue: QueueName) -> QueueConcurrency {
        *self.concurrency.get(&queue).unwrap().lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_reserve_ack_roundtrip() {
        let bus = QueueBus::new(100, Duration::from_secs(120), RetryPolicy::default());
        let id = bus.enqueue(QueueName::FileAnalysis, serde_json::json!({"path": "a.rs"}), None);
        let job = bus.reserve(QueueName::FileAnalysis).unwrap();
        assert_eq!(job.id, id);
        bus.ack(&job.id).unwrap();
        let stats = bus.stats(QueueName::FileAnalysis);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.active, 0);
    }

    #[test]
    fn enqueue_is_idempotent_on_dedupe_key() {
        let bus = QueueBus::new(100, Duration::from_secs(120), RetryPolicy::default());
        let a = bus.enqueue(QueueName::FileAnalysis, serde_json::json!({}), Some("k".to_string()));
        let b = bus.enqueue(QueueName::FileAnalysis, serde_json::json!({}), Some("k".to_string()));
        assert_eq!(a, b);
        assert_eq!(bus.stats(QueueName::FileAnalysis).waiting, 1);
    }

    #[test]
    fn fail_requeues_until_retries_exhausted_then_moves_to_failed_jobs() {
        let bus = QueueBus::new(100, Duration::from_secs(120), RetryPolicy { max_retries: 1, base_backoff_ms: 1 });
        let _id = bus.enqueue(QueueName::FileAnalysis, serde_json::json!({}), None);
        let job = bus.reserve(QueueName::FileAnalysis).unwrap();
        bus.fail(&job.id, "boom").unwrap();
        assert_eq!(bus.stats(QueueName::FileAnalysis).waiting, 1);

        let job = bus.reserve(QueueName::FileAnalysis).unwrap();
        bus.fail(&job.id, "boom again").unwrap();
        assert_eq!(bus.stats(QueueName::FailedJobs).waiting, 1);
        assert_eq!(bus.stats(QueueName::FailedJobs).failed, 1);
    }

    #[test]
    fn sweeper_reclaims_leaked_reservation() {
        let bus = QueueBus::new(100, Duration::from_millis(1), RetryPolicy::default());
        bus.enqueue(QueueName::FileAnalysis, serde_json::json!({}), None);
        bus.reserve(QueueName::FileAnalysis).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        let reclaimed = bus.sweep_leaked_reservations();
        assert_eq!(reclaimed, 1);
        assert_eq!(bus.stats(QueueName::FileAnalysis).waiting, 1);
    }

    #[test]
    fn reserve_respects_per_queue_concurrency_cap() {
        let bus = QueueBus::new(100, Duration::from_secs(120), RetryPolicy::default());
        for _ in 0..5 {
            bus.enqueue(QueueName::FileAnalysis, serde_json::json!({}), None);
        }
        // default min concurrency is 2
        assert!(bus.reserve(QueueName::FileAnalysis).is_some());
        assert!(bus.reserve(QueueName::FileAnalysis).is_some());
        assert!(bus.reserve(QueueName::FileAnalysis).is_none());
    }
}
