//! Exponential backoff with jitter for periodic loops.

use std::time::Duration;

use rand::Rng;

/// Delay for the given consecutive failure count.
///
/// Zero failures means no extra delay. Otherwise `base * 2^(failures-1)`,
/// capped at `max`, plus up to 10% jitter.
pub fn calculate_backoff(failures: u32, base_ms: u64, max_ms: u64) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u64.saturating_pow(failures - 1);
    let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Tracks consecutive failures of a loop and the extra delay they earn.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    failures: u32,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            failures: 0,
        }
    }

    /// Record a failure and return the delay to add before the next attempt.
    pub fn on_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        calculate_backoff(self.failures, self.base_ms, self.max_ms)
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Extra delay owed for the current failure streak.
    pub fn current_delay(&self) -> Duration {
        calculate_backoff(self.failures, self.base_ms, self.max_ms)
    }
}
