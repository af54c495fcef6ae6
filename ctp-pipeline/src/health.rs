//! Health endpoint detail (§6 + SPEC_FULL.md §2): per-subsystem checks
//! reduced to `HEALTHY | WARNING | CRITICAL` by `ctp_core::telemetry::compute_health`.

use ctp_core::telemetry::{compute_health, PipelineHealth, SubsystemCheck};
use ctp_core::traits::{PipelineStorage, PropertyGraph};
use ctp_queue::{BreakerState, CircuitBreaker};

/// Run every subsystem check and reduce them. `integrity_clean` is `None`
/// before the first run has completed (no verdict yet, reported healthy
/// rather than unknown-as-unhealthy).
pub fn check(
    storage: &dyn PipelineStorage,
    graph: &dyn PropertyGraph,
    breakers: &[(&'static str, &CircuitBreaker)],
    integrity_clean: Option<bool>,
) -> PipelineHealth {
    let mut checks = Vec::new();

    checks.push(match storage.health_check() {
        Ok(true) => SubsystemCheck::ok("relational_store", "self-check passed"),
        Ok(false) => SubsystemCheck::unhealthy("relational_store", "self-check failed"),
        Err(e) => SubsystemCheck::unhealthy("relational_store", e.to_string()),
    });

    checks.push(match graph.node_count() {
        Ok(n) => SubsystemCheck::ok("graph_store", format!("{n} nodes reachable")),
        Err(e) => SubsystemCheck::unhealthy("graph_store", e.to_string()),
    });

    if let Some(false) = integrity_clean {
        checks.push(SubsystemCheck::unhealthy("integrity_gate", "violations found on last run"));
    } else {
        checks.push(SubsystemCheck::ok("integrity_gate", "clean on last run"));
    }

    let mut open_breakers = 0;
    for (name, breaker) in breakers {
        let state = breaker.state();
        if state == BreakerState::Open {
            open_breakers += 1;
            checks.push(SubsystemCheck::unhealthy(name, format!("breaker open: {:?}", state)));
        } else {
            checks.push(SubsystemCheck::ok(name, format!("breaker {:?}", state)));
        }
    }

    compute_health(&checks, open_breakers)
}
