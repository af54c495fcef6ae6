//! Per-subsystem health checks and the `HEALTHY | WARNING | CRITICAL`
//! reducer for the §6 health endpoint, grounded on
//! `cortex-drift-bridge::health::checks::SubsystemCheck` /
//! `compute_health`.

use serde::{Deserialize, Serialize};

/// Result of a single subsystem health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemCheck {
    pub name: &'static str,
    pub healthy: bool,
    pub detail: String,
}

impl SubsystemCheck {
    pub fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            healthy: true,
            detail: detail.into(),
        }
    }

    pub fn unhealthy(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            healthy: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Aggregate health status + the checks that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineHealth {
    pub status: HealthStatus,
    pub checks: Vec<SubsystemCheck>,
}

/// Reduce per-subsystem checks plus open-breaker count into one status.
/// CRITICAL if the integrity gate or relational/graph store is unhealthy;
/// WARNING if any non-critical subsystem is unhealthy or any breaker is
/// open; HEALTHY otherwise.
pub fn compute_health(checks: &[SubsystemCheck], open_breakers: usize) -> PipelineHealth {
    let critical_unhealthy = checks
        .iter()
        .any(|c| !c.healthy && matches!(c.name, "integrity_gate" | "relational_store" | "graph_store"));

    let any_unhealthy = checks.iter().any(|c| !c.healthy);

    let status = if critical_unhealthy {
        HealthStatus::Critical
    } else if any_unhealthy || open_breakers > 0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    PipelineHealth {
        status,
        checks: checks.to_vec(),
    }
}

/// Tracks consecutive transient failures per component, independent of
/// circuit breakers, so the health endpoint can show WARNING before a
/// breaker actually trips (SPEC_FULL.md §2 degradation tracking).
#[derive(Debug, Default)]
pub struct DegradationTracker {
    consecutive_failures: std::collections::HashMap<String, u32>,
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, component: &str) {
        *self.consecutive_failures.entry(component.to_string()).or_insert(0) += 1;
    }

    pub fn record_success(&mut self, component: &str) {
        self.consecutive_failures.remove(component);
    }

    /// A component is "degrading" once it has failed 3+ times in a row
    /// without yet tripping its breaker (breaker defaults open at 5/10).
    pub fn is_degrading(&self, component: &str) -> bool {
        self.consecutive_failures.get(component).copied().unwrap_or(0) >= 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_healthy_is_healthy() {
        let checks = vec![SubsystemCheck::ok("relational_store", "ok")];
        let health = compute_health(&checks, 0);
        assert_eq!(health.status, HealthStatus::Healthy);
    }

    #[test]
    fn open_breaker_is_warning() {
        let checks = vec![SubsystemCheck::ok("relational_store", "ok")];
        let health = compute_health(&checks, 1);
        assert_eq!(health.status, HealthStatus::Warning);
    }

    #[test]
    fn unhealthy_critical_subsystem_is_critical() {
        let checks = vec![SubsystemCheck::unhealthy("graph_store", "unreachable")];
        let health = compute_health(&checks, 0);
        assert_eq!(health.status, HealthStatus::Critical);
    }

    #[test]
    fn degradation_tracker_trips_after_three() {
        let mut tracker = DegradationTracker::new();
        for _ in 0..3 {
            tracker.record_failure("llm_client");
        }
        assert!(tracker.is_degrading("llm_client"));
        tracker.record_success("llm_client");
        assert!(!tracker.is_degrading("llm_client"));
    }
}
