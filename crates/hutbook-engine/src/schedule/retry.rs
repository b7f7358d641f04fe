use super::ScheduleConfig;
use crate::attempt::{Attempt, AttemptError, AttemptOutcome};
use crate::request::BookingRequest;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Final result for one booking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Disposition {
    Completed { attempts: u32 },
    AwaitingConfirmation { attempts: u32 },
    DryRunStopped { attempts: u32 },
    Exhausted { attempts: u32, reason: String },
    Fatal { attempts: u32, reason: String },
}

impl Disposition {
    pub fn from_outcome(outcome: AttemptOutcome, attempts: u32) -> Self {
        match outcome {
            AttemptOutcome::Completed => Disposition::Completed { attempts },
            AttemptOutcome::AwaitingConfirmation => Disposition::AwaitingConfirmation { attempts },
            AttemptOutcome::DryRunStopped => Disposition::DryRunStopped { attempts },
        }
    }

    /// Completed, AwaitingConfirmation and DryRunStopped all count as success.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Disposition::Completed { .. }
                | Disposition::AwaitingConfirmation { .. }
                | Disposition::DryRunStopped { .. }
        )
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Disposition::Completed { attempts }
            | Disposition::AwaitingConfirmation { attempts }
            | Disposition::DryRunStopped { attempts }
            | Disposition::Exhausted { attempts, .. }
            | Disposition::Fatal { attempts, .. } => *attempts,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Disposition::Completed { .. } => "Completed",
            Disposition::AwaitingConfirmation { .. } => "AwaitingConfirmation",
            Disposition::DryRunStopped { .. } => "DryRunStopped",
            Disposition::Exhausted { .. } => "Exhausted",
            Disposition::Fatal { .. } => "Fatal",
        }
    }

    /// Human-readable explanation.
    pub fn reason(&self) -> String {
        match self {
            Disposition::Completed { .. } => "reservation submitted".to_string(),
            Disposition::AwaitingConfirmation { .. } => {
                "summary ready; rerun with --confirm-submit to submit".to_string()
            }
            Disposition::DryRunStopped { .. } => "dry run stopped before submit".to_string(),
            Disposition::Exhausted { reason, .. } | Disposition::Fatal { reason, .. } => {
                reason.clone()
            }
        }
    }
}

/// Suspends the single thread of control between attempts.
#[async_trait]
pub trait Pacer: Send {
    async fn pause(&mut self, duration: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded retry around an [`Attempt`].
pub struct RetryScheduler<A: Attempt, P: Pacer = TokioPacer> {
    attempt: A,
    pacer: P,
    rng: StdRng,
}

impl<A: Attempt> RetryScheduler<A, TokioPacer> {
    pub fn new(attempt: A) -> Self {
        Self {
            attempt,
            pacer: TokioPacer,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<A: Attempt, P: Pacer> RetryScheduler<A, P> {
    /// Deterministic jitter, for tests and reproducible runs.
    pub fn with_pacer(attempt: A, pacer: P, seed: u64) -> Self {
        Self {
            attempt,
            pacer,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `interval + uniform[0, jitter)`, at millisecond resolution.
    pub fn next_delay(&mut self, schedule: &ScheduleConfig) -> Duration {
        let jitter_ms = schedule.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            self.rng.gen_range(0..jitter_ms)
        };
        schedule.interval + Duration::from_millis(extra)
    }

    /// Sleep once on `schedule`; returns the delay used.
    pub async fn pause(&mut self, schedule: &ScheduleConfig) -> Duration {
        let delay = self.next_delay(schedule);
        self.pacer.pause(delay).await;
        delay
    }

    pub async fn attempt_once(
        &mut self,
        request: &BookingRequest,
        attempt: u32,
    ) -> Result<AttemptOutcome, AttemptError> {
        self.attempt.run_attempt(request, attempt).await
    }

    /// Retry `request` on its own schedule until it succeeds, fails fatally or
    /// runs out of attempts.
    pub async fn run(&mut self, request: &BookingRequest) -> Disposition {
        let schedule = request.schedule();
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt_once(request, attempts).await {
                Ok(outcome) => return Disposition::from_outcome(outcome, attempts),
                Err(AttemptError::Fatal(e)) => {
                    return Disposition::Fatal {
                        attempts,
                        reason: e.to_string(),
                    };
                }
                Err(AttemptError::Unavailable(reason)) => {
                    if schedule.limit_reached(attempts) {
                        warn!(
                            "[{}] Giving up after {} attempts: {}",
                            request.label, attempts, reason
                        );
                        return Disposition::Exhausted { attempts, reason };
                    }
                    let delay = self.next_delay(&schedule);
                    info!(
                        "[{}] Attempt {}: {}. Retrying in {}s.",
                        request.label,
                        attempts,
                        reason,
                        delay.as_secs()
                    );
                    self.pacer.pause(delay).await;
                }
            }
        }
    }
}
