//! Probe command - poll one endpoint until it answers as expected

use clap::Args;
use routecheck_probe::ResponsePoller;
use tracing::info;

use super::{Expectation, PollArgs, TargetArgs};
use crate::Result;

/// Poll an endpoint until it answers as expected
#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// success, not-found, redirect, redirect-strict, status=N or body=TEXT
    #[arg(long, default_value = "success")]
    pub expect: Expectation,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Run the probe command
pub async fn run(args: ProbeArgs) -> Result<()> {
    let settings = args.poll.settings()?;
    let policy = args.poll.policy()?;
    let target = args.target.target();
    let predicate = args.expect.predicate();
    let poller = ResponsePoller::new(args.target.client(&settings)?);

    let result = poller
        .poll(&target, &policy, predicate.as_ref())
        .await?
        .ensure_succeeded(&predicate.describe())?;

    info!(
        probe = %target,
        attempts = result.attempts,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "probe converged"
    );
    println!("{}", result.last_observation);
    Ok(())
}
