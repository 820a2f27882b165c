//! Concurrent request tracking for a backend worker.
//!
//! The reported load is the number of live `InFlightGuard`s.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Shared counter of requests currently being processed.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<AtomicU64>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of in-flight requests.
    pub fn current(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    /// Count a request until the returned guard is dropped.
    pub fn enter(&self) -> InFlightGuard {
        let now = self.active.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::record_in_flight(now);
        InFlightGuard {
            counter: self.clone(),
        }
    }
}

/// A RAII guard that holds one slot of the in-flight count.
#[derive(Debug)]
pub struct InFlightGuard {
    counter: InFlight,
}

impl Deref for InFlightGuard {
    type Target = InFlight;
    fn deref(&self) -> &Self::Target {
        &self.counter
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.counter.active.fetch_sub(1, Ordering::Relaxed) - 1;
        metrics::record_in_flight(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_counts_while_alive() {
        let in_flight = InFlight::new();
        let a = in_flight.enter();
        let b = in_flight.enter();
        assert_eq!(in_flight.current(), 2);
        assert_eq!(a.current(), 2);

        drop(a);
        assert_eq!(in_flight.current(), 1);
        drop(b);
        assert_eq!(in_flight.current(), 0);
    }
}
