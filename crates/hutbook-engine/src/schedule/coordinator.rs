//! Several booking requests racing for scarce slots on one cadence.
//!
//! Requests that do not poll run once, immediately, in input order. Polled
//! requests advance in cycles: every pending request gets one attempt, then
//! the coordinator sleeps once. The cycle counter is what `max_attempts`
//! bounds.

use super::ScheduleConfig;
use super::retry::{Disposition, Pacer, RetryScheduler, TokioPacer};
use crate::attempt::{Attempt, AttemptError};
use crate::request::BookingRequest;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error(
        "Polled requests '{first}' and '{second}' disagree on {setting} ({first_value} vs {second_value}); polled requests must share one schedule"
    )]
    IrreconcilableSchedules {
        first: String,
        second: String,
        setting: &'static str,
        first_value: String,
        second_value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestReport {
    pub label: String,
    pub disposition: Disposition,
}

pub struct MultiRequestCoordinator<A: Attempt, P: Pacer = TokioPacer> {
    scheduler: RetryScheduler<A, P>,
}

impl<A: Attempt, P: Pacer> MultiRequestCoordinator<A, P> {
    pub fn new(scheduler: RetryScheduler<A, P>) -> Self {
        Self { scheduler }
    }

    /// The schedule shared by every polled request, or `None` when nothing
    /// polls. Fails when two polled requests disagree on any field.
    pub fn shared_schedule(
        requests: &[BookingRequest],
    ) -> Result<Option<ScheduleConfig>, CoordinatorError> {
        let mut polled = requests.iter().filter(|r| r.polls());
        let Some(first) = polled.next() else {
            return Ok(None);
        };
        let schedule = first.schedule();

        for other in polled {
            let theirs = other.schedule();
            let mismatch = if theirs.interval != schedule.interval {
                Some((
                    "poll_interval_seconds",
                    schedule.interval.as_secs().to_string(),
                    theirs.interval.as_secs().to_string(),
                ))
            } else if theirs.jitter != schedule.jitter {
                Some((
                    "jitter_seconds",
                    schedule.jitter.as_secs().to_string(),
                    theirs.jitter.as_secs().to_string(),
                ))
            } else if theirs.max_attempts != schedule.max_attempts {
                Some((
                    "max_attempts",
                    schedule.max_attempts.to_string(),
                    theirs.max_attempts.to_string(),
                ))
            } else {
                None
            };

            if let Some((setting, first_value, second_value)) = mismatch {
                return Err(CoordinatorError::IrreconcilableSchedules {
                    first: first.label.clone(),
                    second: other.label.clone(),
                    setting,
                    first_value,
                    second_value,
                });
            }
        }
        Ok(Some(schedule))
    }

    /// Run every request to a final disposition, reported in input order.
    ///
    /// The schedule check happens before any attempt starts. A fatal failure
    /// in any request aborts the run; requests not finished by then are
    /// reported as fatal too.
    pub async fn run(
        &mut self,
        requests: &[BookingRequest],
    ) -> Result<Vec<RequestReport>, CoordinatorError> {
        let schedule = Self::shared_schedule(requests)?;
        let mut results: Vec<Option<Disposition>> = vec![None; requests.len()];
        let mut aborted: Option<String> = None;

        for (idx, request) in requests.iter().enumerate().filter(|(_, r)| !r.polls()) {
            if let Some(cause) = &aborted {
                results[idx] = Some(aborted_disposition(0, cause));
                continue;
            }
            let disposition = match self.scheduler.attempt_once(request, 1).await {
                Ok(outcome) => Disposition::from_outcome(outcome, 1),
                Err(AttemptError::Unavailable(reason)) => Disposition::Exhausted {
                    attempts: 1,
                    reason,
                },
                Err(AttemptError::Fatal(e)) => {
                    aborted = Some(format!("{}: {}", request.label, e));
                    Disposition::Fatal {
                        attempts: 1,
                        reason: e.to_string(),
                    }
                }
            };
            info!("[{}] {}", request.label, disposition.name());
            results[idx] = Some(disposition);
        }

        let polled: Vec<usize> = requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.polls())
            .map(|(idx, _)| idx)
            .collect();

        match (&aborted, schedule, polled.as_slice()) {
            (Some(cause), _, _) => {
                for &idx in &polled {
                    results[idx] = Some(aborted_disposition(0, cause));
                }
            }
            (None, _, [only]) => {
                results[*only] = Some(self.scheduler.run(&requests[*only]).await);
            }
            (None, Some(schedule), _) if !polled.is_empty() => {
                self.run_cycles(requests, polled.clone(), &schedule, &mut results)
                    .await;
            }
            _ => {}
        }

        Ok(requests
            .iter()
            .zip(results)
            .map(|(request, disposition)| RequestReport {
                label: request.label.clone(),
                disposition: disposition.unwrap_or_else(|| Disposition::Fatal {
                    attempts: 0,
                    reason: "request was never attempted".to_string(),
                }),
            })
            .collect())
    }

    async fn run_cycles(
        &mut self,
        requests: &[BookingRequest],
        mut pending: Vec<usize>,
        schedule: &ScheduleConfig,
        results: &mut [Option<Disposition>],
    ) {
        let mut last_reason: Vec<String> = vec![String::new(); requests.len()];
        let mut cycle = 0;

        loop {
            cycle += 1;
            info!("Polling cycle {} ({} pending)", cycle, pending.len());
            let mut still_pending = Vec::new();

            for (pos, &idx) in pending.iter().enumerate() {
                let request = &requests[idx];
                match self.scheduler.attempt_once(request, cycle).await {
                    Ok(outcome) => {
                        let disposition = Disposition::from_outcome(outcome, cycle);
                        info!("[{}] {} in cycle {}", request.label, disposition.name(), cycle);
                        results[idx] = Some(disposition);
                    }
                    Err(AttemptError::Unavailable(reason)) => {
                        info!("[{}] cycle {}: {}", request.label, cycle, reason);
                        last_reason[idx] = reason;
                        still_pending.push(idx);
                    }
                    Err(AttemptError::Fatal(e)) => {
                        let cause = format!("{}: {}", request.label, e);
                        results[idx] = Some(Disposition::Fatal {
                            attempts: cycle,
                            reason: e.to_string(),
                        });
                        for &rest in still_pending.iter().chain(&pending[pos + 1..]) {
                            results[rest] = Some(aborted_disposition(cycle, &cause));
                        }
                        return;
                    }
                }
            }

            pending = still_pending;
            if pending.is_empty() {
                return;
            }
            if schedule.limit_reached(cycle) {
                for &idx in &pending {
                    warn!(
                        "[{}] Giving up after {} cycles",
                        requests[idx].label, cycle
                    );
                    results[idx] = Some(Disposition::Exhausted {
                        attempts: cycle,
                        reason: std::mem::take(&mut last_reason[idx]),
                    });
                }
                return;
            }

            let delay = self.scheduler.pause(schedule).await;
            info!("Cycle {} done; slept {}s", cycle, delay.as_secs());
        }
    }
}

fn aborted_disposition(attempts: u32, cause: &str) -> Disposition {
    Disposition::Fatal {
        attempts,
        reason: format!("run aborted after fatal failure in {}", cause),
    }
}
