//! routecheck CLI
//!
//! Verifies that a RouteGroup converges into a working load balancer, DNS
//! record and set of HTTP routes.

use clap::Parser;
use tracing::error;

use routecheck_cli::{Cli, Result};
use routecheck_common::telemetry::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    cli.run()
        .await
        .inspect_err(|e| error!(error = %e, "routecheck failed"))
}
