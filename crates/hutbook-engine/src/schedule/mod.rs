//! Retrying attempts on a fixed cadence with jitter.

pub mod coordinator;
pub mod retry;

pub use coordinator::{CoordinatorError, MultiRequestCoordinator, RequestReport};
pub use retry::{Disposition, Pacer, RetryScheduler, TokioPacer};

use std::time::Duration;

/// Shared polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub interval: Duration,
    /// Upper bound (exclusive) of the random delay added to `interval`.
    pub jitter: Duration,
    /// 0 means unbounded.
    pub max_attempts: u32,
}

impl ScheduleConfig {
    pub fn limit_reached(&self, attempts: u32) -> bool {
        self.max_attempts > 0 && attempts >= self.max_attempts
    }
}
