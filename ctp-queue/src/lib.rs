//! Queue bus, worker-pool scaling, and circuit breakers (§4.1, §4.6).

pub mod breaker;
pub mod bus;
pub mod concurrency;
pub mod job;
pub mod scaling;
pub mod sweeper;

pub use breaker::{Admission, BreakerState, CircuitBreaker};
pub use bus::QueueBus;
pub use concurrency::{ConcurrencyGate, Permit};
pub use job::{Job, JobState, QueueName, QueueStats, RetryPolicy};
pub use scaling::{evaluate, QueueConcurrency, ResourceBudget};
