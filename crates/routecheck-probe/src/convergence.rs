//! Fixed-interval convergence polling
//!
//! Both the response poller and the status watcher reduce to the same loop:
//! observe, classify, stop on a terminal verdict, otherwise sleep one interval
//! and try again until the deadline. The loop never backs off; the external
//! pipeline converges on its own schedule and polling faster or slower does
//! not change that.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::ProbeError;
use crate::policy::{Clock, PollPolicy};
use crate::predicate::Classification;
use crate::Result;

/// How a convergence poll ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A classification accepted the observation
    Accepted,
    /// A classification rejected the observation
    Rejected,
    /// The deadline elapsed while still pending
    TimedOut,
}

/// Result of one convergence poll.
///
/// Timeouts and rejections are values here, not errors: callers decide whether
/// a non-converged result fails their scenario, usually via
/// [`ConvergenceResult::ensure_succeeded`].
#[must_use = "a convergence result must be checked, e.g. with ensure_succeeded"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceResult<O> {
    /// How polling ended
    pub outcome: Outcome,
    /// Observation that ended polling, or the last one before the deadline
    pub last_observation: O,
    /// Observations taken, at least one
    pub attempts: u32,
    /// Time from the first attempt to the end of polling
    pub elapsed: Duration,
    /// Deadline the poll ran against
    pub timeout: Duration,
}

impl<O> ConvergenceResult<O> {
    /// Whether the poll converged
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Accepted
    }

    /// Whether the poll ran out of time
    pub fn timed_out(&self) -> bool {
        self.outcome == Outcome::TimedOut
    }
}

impl<O: fmt::Display> ConvergenceResult<O> {
    /// Turn a non-converged result into an error naming `stage`.
    pub fn ensure_succeeded(self, stage: &str) -> Result<Self> {
        match self.outcome {
            Outcome::Accepted => Ok(self),
            Outcome::Rejected => Err(ProbeError::Rejected {
                stage: stage.to_string(),
                attempts: self.attempts,
                elapsed: self.elapsed,
                observation: self.last_observation.to_string(),
            }),
            Outcome::TimedOut => Err(ProbeError::ConvergenceTimeout {
                stage: stage.to_string(),
                timeout: self.timeout,
                attempts: self.attempts,
                elapsed: self.elapsed,
                last_observation: self.last_observation.to_string(),
            }),
        }
    }
}

/// Poll `observe` until `classify` returns a terminal verdict or the policy
/// deadline passes.
///
/// Each observation races the time left before the deadline; when the
/// deadline wins, `on_deadline` stands in for the observation that never
/// arrived. Sleeps are clipped to the remaining time too, so the loop returns
/// by `timeout` no matter how slowly `observe` answers.
pub(crate) async fn converge<O, F, Fut, C, D>(
    clock: &dyn Clock,
    policy: &PollPolicy,
    label: &str,
    mut observe: F,
    classify: C,
    on_deadline: D,
) -> ConvergenceResult<O>
where
    O: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = O>,
    C: Fn(&O) -> Classification,
    D: Fn() -> O,
{
    let start = clock.now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let remaining = policy
            .timeout()
            .saturating_sub(clock.now().saturating_duration_since(start));
        let observation = tokio::select! {
            biased;
            observation = observe() => observation,
            _ = clock.sleep(remaining) => on_deadline(),
        };
        let verdict = classify(&observation);
        let elapsed = clock.now().saturating_duration_since(start);

        let outcome = match verdict {
            Classification::Accepted => {
                info!(
                    stage = %label,
                    attempt = attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    observation = %observation,
                    "converged"
                );
                Outcome::Accepted
            }
            Classification::Rejected => {
                error!(
                    stage = %label,
                    attempt = attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    observation = %observation,
                    "rejected, not retrying"
                );
                Outcome::Rejected
            }
            Classification::Pending if elapsed >= policy.timeout() => {
                error!(
                    stage = %label,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    observation = %observation,
                    "timed out while pending"
                );
                Outcome::TimedOut
            }
            Classification::Pending => {
                debug!(
                    stage = %label,
                    attempt = attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    observation = %observation,
                    "pending"
                );
                let remaining = policy.timeout().saturating_sub(elapsed);
                clock.sleep(policy.interval().min(remaining)).await;
                continue;
            }
        };

        return ConvergenceResult {
            outcome,
            last_observation: observation,
            attempts,
            elapsed,
            timeout: policy.timeout(),
        };
    }
}
