//! routecheck CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};
use routecheck_common::telemetry::LogFormat;

/// routecheck - verify RouteGroup convergence from the outside
#[derive(Parser, Debug)]
#[command(name = "routecheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format: text or json
    #[arg(
        long,
        global = true,
        env = "ROUTECHECK_LOG_FORMAT",
        default_value = "text"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait until a RouteGroup reports its load balancer address
    WaitAddress(commands::wait_address::WaitAddressArgs),
    /// Poll an endpoint until it answers as expected
    Probe(commands::probe::ProbeArgs),
    /// Sample an endpoint and check the status distribution
    Sample(commands::sample::SampleArgs),
    /// Run the standard convergence stages for a RouteGroup
    Converge(commands::converge::ConvergeArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::WaitAddress(args) => commands::wait_address::run(args).await,
            Commands::Probe(args) => commands::probe::run(args).await,
            Commands::Sample(args) => commands::sample::run(args).await,
            Commands::Converge(args) => commands::converge::run(args).await,
        }
    }
}
