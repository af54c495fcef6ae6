//! Global LLM-concurrency gate (§4.1, §6 `GLOBAL_LLM_CONCURRENCY`):
//! cooperative wait, not a failure, when the hard cap is reached.

use std::sync::{Condvar, Mutex};

pub struct ConcurrencyGate {
    cap: usize,
    state: Mutex<usize>,
    wakeup: Condvar,
}

/// RAII permit; dropping it releases the slot and wakes one waiter.
pub struct Permit<'a> {
    gate: &'a ConcurrencyGate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.gate.state.lock().unwrap();
        *in_flight -= 1;
        self.gate.wakeup.notify_one();
    }
}

impl ConcurrencyGate {
    pub fn new(cap: usize) -> Self {
        Self { cap, state: Mutex::new(0), wakeup: Condvar::new() }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn in_flight(&self) -> usize {
        *self.state.lock().unwrap()
    }

    /// Block the calling worker thread until a slot is free, then take it.
    /// This is the back-pressure mechanism: `reserve` blocks rather than
    /// failing when the cap is reached.
    pub fn acquire(&self) -> Permit<'_> {
        let mut in_flight = self.state.lock().unwrap();
        while *in_flight >= self.cap {
            in_flight = self.wakeup.wait(in_flight).unwrap();
        }
        *in_flight += 1;
        Permit { gate: self }
    }

    /// Non-blocking variant used by async callers that cooperatively poll
    /// instead of parking a thread.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut in_flight = self.state.lock().unwrap();
        if *in_flight >= self.cap {
            return None;
        }
        *in_flight += 1;
        Some(Permit { gate: self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn never_exceeds_cap() {
        let gate = Arc::new(ConcurrencyGate::new(2));
        let _p1 = gate.acquire();
        let _p2 = gate.acquire();
        assert!(gate.try_acquire().is_none());
        assert_eq!(gate.in_flight(), 2);
    }

    #[test]
    fn release_wakes_a_waiter() {
        let gate = Arc::new(ConcurrencyGate::new(1));
        let p1 = gate.acquire();
        let gate2 = gate.clone();
        let handle = thread::spawn(move || {
            let _p = gate2.acquire();
        });
        thread::sleep(Duration::from_millis(20));
        drop(p1);
        handle.join().unwrap();
        assert_eq!(gate.in_flight(), 0);
    }
}
