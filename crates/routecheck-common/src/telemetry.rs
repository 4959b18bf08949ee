//! Logging initialisation
//!
//! Every probe attempt, stage result and timeout is emitted as a `tracing`
//! event with structured fields. This module installs the subscriber that
//! renders them: human-readable for terminals, JSON for CI log collectors.

use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,routecheck=debug,kube=info,hyper=warn,reqwest=warn";

/// Output format for log events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::config(
                "log-format",
                format!("unknown format '{other}', expected text or json"),
            )),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed (e.g. a second call in the same
/// process); callers in test suites should use [`try_init_for_tests`].
pub fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            )
            .try_init(),
    };

    result.map_err(|e| Error::telemetry(e.to_string()))
}

/// Install a text subscriber once, ignoring "already installed" errors.
pub fn try_init_for_tests() {
    let _ = init_logging(LogFormat::Text);
}
