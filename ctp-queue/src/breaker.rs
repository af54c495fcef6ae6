//! Per-dependency circuit breaker (§4.6): `CLOSED -> OPEN -> HALF_OPEN ->
//! CLOSED`. One breaker wraps each logical dependency (LLM client, graph
//! store, relational store, per-worker class). State lives behind a single
//! `Mutex`, following the connection pool's "one lock, no hidden globals"
//! discipline (`ctp_storage::pool::ConnectionPool`).

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// A single breaker. `fail_limit` and `cooldown` are per-instance so the
/// reconciliation worker class can use a higher tolerance (10) than the
/// default (5) per §6.
pub struct CircuitBreaker {
    name: String,
    fail_limit: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

/// Outcome of asking a breaker for permission to call through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Call through normally.
    Admit,
    /// This is the single HALF_OPEN probe call — report its outcome.
    Probe,
    /// Breaker is OPEN and cooldown hasn't elapsed; fail fast.
    Rejected,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, fail_limit: u32, cooldown: Duration) -> Self {
        Self {
            name: name.into(),
            fail_limit,
            cooldown,
            inner: Mutex::new(Inner { state: BreakerState::Closed, consecutive_failures: 0, opened_at: None }),
        }
    }

    pub fn default_for(name: impl Into<String>) -> Self {
        Self::new(name, 5, Duration::from_secs(60))
    }

    /// Higher failure tolerance for the reconciliation worker class (§4.1).
    pub fn reconciliation(name: impl Into<String>) -> Self {
        Self::new(name, 10, Duration::from_secs(60))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().unwrap().state
    }

    /// Ask whether a call may proceed. HALF_OPEN admits exactly one probe;
    /// subsequent callers while still HALF_OPEN are rejected until that
    /// probe resolves (`record_success`/`record_failure`).
    pub fn try_admit(&self) -> Admission {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            BreakerState::Closed => Admission::Admit,
            BreakerState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.cooldown {
                    inner.state = BreakerState::HalfOpen;
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            BreakerState::HalfOpen => Admission::Rejected,
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
            }
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.fail_limit {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::Open => {}
        }
    }

    /// Manual reset, bypassing cooldown (§4.6).
    pub fn reset(&self) {
        self.record_success();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_fail_limit() {
        let breaker = CircuitBreaker::new("llm", 3, Duration::from_secs(60));
        for _ in 0..3 {
            assert_eq!(breaker.try_admit(), Admission::Admit);
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Open);
        assert_eq!(breaker.try_admit(), Admission::Rejected);
    }

    #[test]
    fn half_open_probe_then_close_on_success() {
        let breaker = CircuitBreaker::new("llm", 1, Duration::from_millis(1));
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(breaker.try_admit(), Admission::Probe);
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn half_open_probe_failure_reopens_with_fresh_cooldown() {
        let breaker = CircuitBreaker::new("llm", 1, Duration::from_millis(1));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(breaker.try_admit(), Admission::Probe);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert_eq!(breaker.try_admit(), Admission::Rejected);
    }

    #[test]
    fn manual_reset_closes_from_open() {
        let breaker = CircuitBreaker::new("llm", 1, Duration::from_secs(60));
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        breaker.reset();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
