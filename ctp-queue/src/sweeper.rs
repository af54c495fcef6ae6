//! Periodic sweep for leaked reservations (§4.1): a worker that reserves a
//! job but never acks/fails within `max_job_time` leaves it stranded in
//! `active`. Call `run_once` on a 60 s tick (production) or directly in
//! tests.

use std::sync::Arc;
use std::time::Duration;

use crate::bus::QueueBus;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Runs one sweep pass, logging how many reservations were reclaimed.
pub fn run_once(bus: &QueueBus) -> usize {
    let reclaimed = bus.sweep_leaked_reservations();
    if reclaimed > 0 {
        tracing::warn!(reclaimed, "sweeper reclaimed leaked job reservations");
    }
    reclaimed
}

/// Spawns a background thread that sweeps on `interval` until the returned
/// handle is dropped... callers that want graceful shutdown should instead
/// loop `run_once` themselves against a cancellation flag, as the pipeline
/// orchestrator does.
pub fn spawn_periodic(bus: Arc<QueueBus>, interval: Duration) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("ctp-sweeper".to_string())
        .spawn(move || loop {
            std::thread::sleep(interval);
            run_once(&bus);
        })
        .expect("failed to spawn sweeper thread")
}
