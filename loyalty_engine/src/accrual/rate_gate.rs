use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
        TryLockError,
    },
    time::Duration,
};

use tokio::time::Instant;

/// A process-wide "do not call the accrual service before" deadline.
///
/// The accrual service rate-limits all of its clients together, so the deadline is shared by every worker and every
/// order. The deadline is stored as microseconds since the gate was created. It only ever moves forward.
#[derive(Debug)]
pub struct RateLimitGate {
    origin: Instant,
    not_before_us: AtomicU64,
    raising: Mutex<()>,
}

impl Default for RateLimitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self { origin: Instant::now(), not_before_us: AtomicU64::new(0), raising: Mutex::new(()) }
    }

    /// How long the caller has to wait before it may call the accrual service. Zero if the gate is open.
    pub fn must_wait(&self) -> Duration {
        let not_before = self.not_before_us.load(Ordering::Acquire);
        Duration::from_micros(not_before.saturating_sub(self.now_us()))
    }

    /// Closes the gate for `retry_after` from now.
    ///
    /// The deadline is always stored, even when another worker is raising the gate at the same moment. Only the
    /// caller holding the lock reports the move, so a burst of rate-limit responses is logged once. Returns true if
    /// this call moved the deadline.
    pub fn raise(&self, retry_after: Duration) -> bool {
        let wait_us = u64::try_from(retry_after.as_micros()).unwrap_or(u64::MAX);
        // Round up so that the gate never opens early
        let deadline = self.now_us().saturating_add(wait_us).saturating_add(1);
        let _guard = match self.raising.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                self.not_before_us.fetch_max(deadline, Ordering::AcqRel);
                return false;
            },
        };
        let previous = self.not_before_us.fetch_max(deadline, Ordering::AcqRel);
        previous < deadline
    }

    fn now_us(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}
