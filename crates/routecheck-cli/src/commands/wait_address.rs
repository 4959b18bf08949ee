//! Wait-address command - block until the load balancer address is set

use std::sync::Arc;

use clap::Args;
use routecheck_probe::{KubeStatusSource, ResourceRef, StatusWatcher};

use super::{KubeArgs, PollArgs};
use crate::Result;

/// Wait for a RouteGroup's load balancer address
#[derive(Args, Debug)]
pub struct WaitAddressArgs {
    /// Namespace of the RouteGroup
    #[arg(short, long)]
    pub namespace: String,

    /// Name of the RouteGroup
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub kube: KubeArgs,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Run the wait-address command
pub async fn run(args: WaitAddressArgs) -> Result<()> {
    let policy = args.poll.policy()?;
    let client = args.kube.client().await?;
    let watcher = StatusWatcher::new(Arc::new(KubeStatusSource::new(client)));

    let provisioned = watcher
        .wait_for_address(&ResourceRef::new(args.namespace, args.name), &policy)
        .await?;
    println!("{}", provisioned.address);
    Ok(())
}
