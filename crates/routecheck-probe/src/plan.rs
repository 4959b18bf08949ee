//! Ordered convergence stages
//!
//! A RouteGroup becomes reachable in a fixed order: plain HTTP redirects first,
//! then the load balancer answers 404 for unknown hosts, then the DNS name
//! serves the backend. A plan runs one poll per stage in that order and stops
//! at the first stage that times out or is rejected, since every later stage
//! depends on it.

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::convergence::ConvergenceResult;
use crate::observation::Observation;
use crate::policy::PollPolicy;
use crate::poller::ResponsePoller;
use crate::predicate::Predicate;
use crate::target::ProbeTarget;
use crate::Result;

struct Stage {
    name: String,
    target: ProbeTarget,
    predicate: Box<dyn Predicate>,
    policy: PollPolicy,
}

/// What a converged stage took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Stage name
    pub stage: String,
    /// Requests issued
    pub attempts: u32,
    /// Time until convergence
    pub elapsed: Duration,
    /// The accepted observation
    pub last_observation: Observation,
}

impl StageReport {
    /// Report for `stage` from its converged poll
    pub fn new(stage: impl Into<String>, result: ConvergenceResult<Observation>) -> Self {
        Self {
            stage: stage.into(),
            attempts: result.attempts,
            elapsed: result.elapsed,
            last_observation: result.last_observation,
        }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} after {} attempts ({:?})",
            self.stage, self.last_observation, self.attempts, self.elapsed
        )
    }
}

/// Ordered list of stages run sequentially with fail-fast semantics.
#[derive(Default)]
pub struct ConvergencePlan {
    stages: Vec<Stage>,
}

impl ConvergencePlan {
    /// Empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn stage(
        mut self,
        name: impl Into<String>,
        target: ProbeTarget,
        predicate: impl Predicate + 'static,
        policy: PollPolicy,
    ) -> Self {
        self.stages.push(Stage {
            name: name.into(),
            target,
            predicate: Box::new(predicate),
            policy,
        });
        self
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the plan has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in run order
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    /// Run every stage in order.
    ///
    /// All targets are validated before the first request, so a malformed
    /// later stage fails without waiting out the earlier ones. Each stage
    /// polls against its own deadline; the first failure aborts the rest.
    pub async fn run(&self, poller: &ResponsePoller) -> Result<Vec<StageReport>> {
        for stage in &self.stages {
            stage.target.validate()?;
        }

        let mut reports = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            info!(
                stage = %stage.name,
                step = index + 1,
                of = self.stages.len(),
                "starting stage"
            );
            let result = poller
                .poll(&stage.target, &stage.policy, stage.predicate.as_ref())
                .await?
                .ensure_succeeded(&stage.name)?;

            let report = StageReport::new(stage.name.as_str(), result);
            info!(report = %report, "stage converged");
            reports.push(report);
        }
        Ok(reports)
    }
}
