//! Converge command - the standard stages a fresh RouteGroup goes through
//!
//! Once the controller publishes an address, the load balancer must redirect
//! plain HTTP, answer HTTPS for unknown hosts with 404, and finally serve the
//! RouteGroup's hostname once DNS has caught up.

use std::sync::Arc;

use clap::Args;
use routecheck_probe::{
    BodyEquals, ConvergencePlan, IsNotFound, IsRedirect, IsSuccess, KubeStatusSource,
    PollPolicy, ProbeClient, ProbeClientConfig, ProbeTarget, ResourceRef, ResponsePoller,
    StatusWatcher,
};
use tracing::info;

use super::{KubeArgs, PollArgs};
use crate::Result;

/// Run the standard convergence stages for a RouteGroup
#[derive(Args, Debug)]
pub struct ConvergeArgs {
    /// Namespace of the RouteGroup
    #[arg(short, long)]
    pub namespace: String,

    /// Name of the RouteGroup
    #[arg(long)]
    pub name: String,

    /// Hostname the RouteGroup serves
    #[arg(long)]
    pub hostname: String,

    /// Path requested on every stage
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Body the hostname must finally serve
    #[arg(long)]
    pub body: Option<String>,

    #[command(flatten)]
    pub kube: KubeArgs,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Stages for a load balancer at `address` fronting `hostname`
pub fn standard_plan(
    address: &str,
    hostname: &str,
    path: &str,
    body: Option<&str>,
    policy: PollPolicy,
) -> ConvergencePlan {
    let mut plan = ConvergencePlan::new()
        .stage(
            "http redirects",
            ProbeTarget::http(address).path(path).skip_verify(true),
            IsRedirect::lenient(),
            policy,
        )
        .stage(
            "load balancer answers",
            ProbeTarget::https(address).path(path).skip_verify(true),
            IsNotFound,
            policy,
        )
        .stage(
            "hostname serves",
            ProbeTarget::https(hostname).path(path),
            IsSuccess,
            policy,
        );
    if let Some(body) = body {
        plan = plan.stage(
            "hostname body",
            ProbeTarget::https(hostname).path(path),
            BodyEquals::new(body),
            policy,
        );
    }
    plan
}

/// Run the converge command
pub async fn run(args: ConvergeArgs) -> Result<()> {
    let settings = args.poll.settings()?;
    let policy = args.poll.policy()?;
    let client = args.kube.client().await?;

    let watcher = StatusWatcher::new(Arc::new(KubeStatusSource::new(client)));
    let resource = ResourceRef::new(&args.namespace, &args.name);
    let provisioned = watcher.wait_for_address(&resource, &policy).await?;
    info!(
        resource = %resource,
        address = %provisioned.address,
        attempts = provisioned.attempts,
        "load balancer address published"
    );

    let plan = standard_plan(
        &provisioned.address,
        &args.hostname,
        &args.path,
        args.body.as_deref(),
        policy,
    );
    let probe = Arc::new(ProbeClient::new(&ProbeClientConfig::from_settings(&settings))?);
    for report in plan.run(&ResponsePoller::new(probe)).await? {
        println!("{report}");
    }
    Ok(())
}
