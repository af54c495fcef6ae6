//! Metrics collector for the §6 observability surface: per-queue stats,
//! per-breaker state, global LLM concurrency, validation cache hit rate,
//! triangulation session throughput, graph-build batch latency.
//!
//! Grounded on `drift-core::telemetry::collector::TelemetryCollector`'s
//! buffer-and-drain shape, repurposed from opt-in usage telemetry into an
//! always-on in-process metrics registry (no PII, nothing leaves the process
//! unless the pipeline binary chooses to serve it over the metrics endpoint).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

/// A single named counter, monotonically increasing.
#[derive(Debug, Default)]
struct Counter(AtomicU64);

/// A single named gauge, set to the latest observed value.
#[derive(Debug, Default)]
struct Gauge(AtomicI64);

/// Process-wide metrics registry. One instance is shared (via `Arc`) across
/// the queue bus, outbox publisher, confidence scorer, validator, and graph
/// builder — each owns the handle it was given at construction (§9: "each
/// owned by exactly one component, not shared across processes").
#[derive(Default)]
pub struct MetricsCollector {
    counters: Mutex<HashMap<String, Counter>>,
    gauges: Mutex<HashMap<String, Gauge>>,
    durations_us: Mutex<HashMap<String, Vec<u64>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&self, name: &str, delta: u64) {
        let mut counters = self.counters.lock().unwrap();
        counters
            .entry(name.to_string())
            .or_default()
            .0
            .fetch_add(delta, Ordering::Relaxed);
    }

    pub fn set_gauge(&self, name: &str, value: i64) {
        let mut gauges = self.gauges.lock().unwrap();
        gauges
            .entry(name.to_string())
            .or_default()
            .0
            .store(value, Ordering::Relaxed);
    }

    pub fn observe_duration_us(&self, name: &str, micros: u64) {
        let mut durations = self.durations_us.lock().unwrap();
        let samples = durations.entry(name.to_string()).or_default();
        // Bound memory: keep the most recent 1000 samples per metric.
        if samples.len() >= 1000 {
            samples.remove(0);
        }
        samples.push(micros);
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(name)
            .map(|c| c.0.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn gauge(&self, name: &str) -> i64 {
        self.gauges
            .lock()
            .unwrap()
            .get(name)
            .map(|g| g.0.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Average observed duration in microseconds, or 0 if no samples yet.
    pub fn avg_duration_us(&self, name: &str) -> u64 {
        let durations = self.durations_us.lock().unwrap();
        match durations.get(name) {
            Some(samples) if !samples.is_empty() => {
                samples.iter().sum::<u64>() / samples.len() as u64
            }
            _ => 0,
        }
    }

    /// Snapshot every counter and gauge for the metrics endpoint (§6).
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.lock().unwrap();
        let gauges = self.gauges.lock().unwrap();
        MetricsSnapshot {
            counters: counters
                .iter()
                .map(|(k, v)| (k.clone(), v.0.load(Ordering::Relaxed)))
                .collect(),
            gauges: gauges
                .iter()
                .map(|(k, v)| (k.clone(), v.0.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub gauges: HashMap<String, i64>,
}
