//! Poll an HTTP target until a predicate accepts or rejects

use std::sync::Arc;

use tracing::info;

use crate::client::HttpProbe;
use crate::convergence::{converge, ConvergenceResult};
use crate::observation::{Observation, TransportErrorKind};
use crate::policy::{Clock, PollPolicy, SystemClock};
use crate::predicate::Predicate;
use crate::target::ProbeTarget;
use crate::Result;

/// Repeatedly probes a target at a fixed interval.
///
/// Cloning shares the underlying HTTP client and clock.
#[derive(Clone)]
pub struct ResponsePoller {
    probe: Arc<dyn HttpProbe>,
    clock: Arc<dyn Clock>,
}

impl ResponsePoller {
    /// Poll with wall-clock time
    pub fn new(probe: Arc<dyn HttpProbe>) -> Self {
        Self::with_clock(probe, Arc::new(SystemClock))
    }

    /// Poll with the given clock
    pub fn with_clock(probe: Arc<dyn HttpProbe>, clock: Arc<dyn Clock>) -> Self {
        Self { probe, clock }
    }

    /// The probe requests go through
    pub fn probe(&self) -> &Arc<dyn HttpProbe> {
        &self.probe
    }

    /// Poll `target` until `predicate` reaches a terminal verdict or the
    /// policy deadline passes.
    ///
    /// Returns `Err` only for a target that can never be probed; timeouts and
    /// rejections are reported through the returned result.
    pub async fn poll(
        &self,
        target: &ProbeTarget,
        policy: &PollPolicy,
        predicate: &dyn Predicate,
    ) -> Result<ConvergenceResult<Observation>> {
        target.validate()?;

        let label = format!("{} expecting {}", target, predicate.describe());
        info!(
            probe = %target,
            expect = %predicate.describe(),
            timeout_secs = policy.timeout().as_secs(),
            "polling"
        );

        Ok(converge(
            self.clock.as_ref(),
            policy,
            &label,
            || self.probe.observe(target),
            |observation| predicate.classify(observation),
            || {
                Observation::transport(
                    TransportErrorKind::Timeout,
                    "stage deadline reached before a response",
                )
            },
        )
        .await)
    }
}
