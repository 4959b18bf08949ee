//! Probe error taxonomy
//!
//! Transient states (connection refused, DNS not resolvable, status not yet
//! matching, address not yet set) never appear here: they are retried inside
//! the poll loop. What surfaces is caller misuse, which fails before any
//! request is made, a local HTTP client that cannot be built, or a terminal
//! verdict carrying the stage, the time spent and the last observation.

use std::time::Duration;

use routecheck_common::crd::RouteGroupStatus;
use thiserror::Error;

/// Errors returned by probes, watchers, samplers and plans
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe target is malformed
    #[error("invalid probe target {target}: {message}")]
    InvalidTarget {
        /// The target as given
        target: String,
        /// What is wrong with it
        message: String,
    },

    /// The poll policy cannot be honoured
    #[error("invalid poll policy: {message}")]
    InvalidPolicy {
        /// What is wrong with it
        message: String,
    },

    /// The resource reference is malformed
    #[error("invalid resource reference {resource}: {message}")]
    InvalidResource {
        /// The reference as given
        resource: String,
        /// What is wrong with it
        message: String,
    },

    /// Sample size or tolerance band is malformed
    #[error("invalid sampling request: {message}")]
    InvalidSample {
        /// What is wrong with it
        message: String,
    },

    /// The deadline elapsed while the stage was still pending
    #[error(
        "stage '{stage}' did not converge within {timeout:?} ({attempts} attempts, {elapsed:?}); last observation: {last_observation}"
    )]
    ConvergenceTimeout {
        /// Stage that timed out
        stage: String,
        /// Configured timeout
        timeout: Duration,
        /// Requests issued
        attempts: u32,
        /// Time spent polling
        elapsed: Duration,
        /// Last observation before giving up
        last_observation: String,
    },

    /// A predicate declared the stage unrecoverable
    #[error(
        "stage '{stage}' rejected after {attempts} attempts ({elapsed:?}): {observation}"
    )]
    Rejected {
        /// Stage that was rejected
        stage: String,
        /// Requests issued
        attempts: u32,
        /// Time spent polling
        elapsed: Duration,
        /// The rejected observation
        observation: String,
    },

    /// The load balancer address never appeared in the resource status
    #[error(
        "{resource} has no load balancer address after {elapsed:?} ({attempts} polls); last status: {}",
        describe_status(.last_status.as_deref(), .last_error.as_deref())
    )]
    ProvisioningTimeout {
        /// Resource that was watched
        resource: String,
        /// Status reads issued
        attempts: u32,
        /// Time spent polling
        elapsed: Duration,
        /// Last status snapshot observed, if the resource had one
        last_status: Option<Box<RouteGroupStatus>>,
        /// Last read error, if the final read failed
        last_error: Option<String>,
    },

    /// A sampled frequency fell outside its tolerance band
    #[error("{key} observed {count}/{total} times, expected between {lower} and {upper}")]
    DistributionOutOfBand {
        /// Classification key
        key: String,
        /// Observed occurrences
        count: usize,
        /// Sample size
        total: usize,
        /// Inclusive lower bound
        lower: usize,
        /// Inclusive upper bound
        upper: usize,
    },

    /// The HTTP client could not be constructed, e.g. no TLS backend or a
    /// bad resolver override. Neither a caller mistake nor a verdict.
    #[error("http client error: {message}")]
    Client {
        /// What failed
        message: String,
    },
}

fn describe_status(status: Option<&RouteGroupStatus>, error: Option<&str>) -> String {
    match (status, error) {
        (_, Some(error)) => format!("read failed: {error}"),
        (Some(status), None) if status.load_balancer.route_group.is_empty() => {
            "loadBalancer.routeGroup is empty".to_string()
        }
        (Some(status), None) => format!("{:?}", status.load_balancer.route_group),
        (None, None) => "resource has no status".to_string(),
    }
}

impl ProbeError {
    /// Create an invalid-target error
    pub fn invalid_target(target: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid-policy error
    pub fn invalid_policy(msg: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: msg.into(),
        }
    }

    /// Create an invalid-resource error
    pub fn invalid_resource(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidResource {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid-sample error
    pub fn invalid_sample(msg: impl Into<String>) -> Self {
        Self::InvalidSample {
            message: msg.into(),
        }
    }

    /// Create an HTTP client error
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client {
            message: msg.into(),
        }
    }

    /// Whether the caller passed something unusable (never retried)
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::InvalidTarget { .. }
                | Self::InvalidPolicy { .. }
                | Self::InvalidResource { .. }
                | Self::InvalidSample { .. }
        )
    }

    /// Whether the local environment could not support probing at all
    pub fn is_environment(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    /// Whether the monitored pipeline simply never converged
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConvergenceTimeout { .. } | Self::ProvisioningTimeout { .. }
        )
    }

    /// The stage this error belongs to, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::ConvergenceTimeout { stage, .. } | Self::Rejected { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
