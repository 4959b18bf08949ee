//! Probe settings resolved from the environment
//!
//! The convergence engine consumes these values but never produces them:
//! per-stage timeout, poll interval, sample size and the hosted zone used to
//! derive scenario hostnames.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Hosted zone used to build scenario hostnames
pub const HOSTED_ZONE_ENV: &str = "E2E_HOSTED_ZONE";
/// Per-stage convergence timeout in seconds
pub const STAGE_TIMEOUT_ENV: &str = "ROUTECHECK_STAGE_TIMEOUT_SECS";
/// Poll interval in milliseconds
pub const POLL_INTERVAL_ENV: &str = "ROUTECHECK_POLL_INTERVAL_MS";
/// Requests issued per distribution check
pub const SAMPLES_ENV: &str = "ROUTECHECK_SAMPLES";
/// Timeout of a single HTTP request in seconds
pub const REQUEST_TIMEOUT_ENV: &str = "ROUTECHECK_REQUEST_TIMEOUT_SECS";

/// Default per-stage timeout (10 minutes, enough for an ALB plus DNS propagation)
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(600);

/// Default poll interval (2 seconds)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of requests per distribution check
pub const DEFAULT_SAMPLES: usize = 100;

/// Default timeout of one HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by the CLI and the end-to-end suite.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    /// Hosted zone for generated hostnames, if configured
    pub hosted_zone: Option<String>,
    /// Timeout applied to each convergence stage
    pub stage_timeout: Duration,
    /// Sleep between attempts within a stage
    pub poll_interval: Duration,
    /// Number of requests per distribution check
    pub samples: usize,
    /// Timeout of one HTTP request
    pub request_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            hosted_zone: None,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            samples: DEFAULT_SAMPLES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ProbeSettings {
    /// Load settings from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let settings = Self {
            hosted_zone: get(HOSTED_ZONE_ENV).map(|z| z.trim().trim_matches('.').to_string()),
            stage_timeout: match get(STAGE_TIMEOUT_ENV) {
                Some(v) => Duration::from_secs(parse_number(STAGE_TIMEOUT_ENV, &v)?),
                None => defaults.stage_timeout,
            },
            poll_interval: match get(POLL_INTERVAL_ENV) {
                Some(v) => Duration::from_millis(parse_number(POLL_INTERVAL_ENV, &v)?),
                None => defaults.poll_interval,
            },
            samples: match get(SAMPLES_ENV) {
                Some(v) => parse_number::<usize>(SAMPLES_ENV, &v)?,
                None => defaults.samples,
            },
            request_timeout: match get(REQUEST_TIMEOUT_ENV) {
                Some(v) => Duration::from_secs(parse_number(REQUEST_TIMEOUT_ENV, &v)?),
                None => defaults.request_timeout,
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject combinations the polling engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::config(POLL_INTERVAL_ENV, "must be greater than zero"));
        }
        if self.poll_interval >= self.stage_timeout {
            return Err(Error::config(
                POLL_INTERVAL_ENV,
                format!(
                    "{:?} must be shorter than the stage timeout {:?}",
                    self.poll_interval, self.stage_timeout
                ),
            ));
        }
        if self.samples == 0 {
            return Err(Error::config(SAMPLES_ENV, "must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config(REQUEST_TIMEOUT_ENV, "must be greater than zero"));
        }
        Ok(())
    }

    /// The configured hosted zone, or a configuration error if unset.
    pub fn require_hosted_zone(&self) -> Result<&str> {
        self.hosted_zone
            .as_deref()
            .ok_or_else(|| Error::config(HOSTED_ZONE_ENV, "not set"))
    }

    /// Generate a scenario hostname in the configured hosted zone.
    pub fn hostname_for(&self, service: &str) -> Result<String> {
        let zone = self.require_hosted_zone()?;
        hostname_for(service, zone, SystemTime::now())
    }
}

/// Build `<service>-<unix seconds>.<zone>`.
///
/// The timestamp keeps repeated runs from colliding on DNS records that
/// external-dns has not yet cleaned up.
pub fn hostname_for(service: &str, zone: &str, now: SystemTime) -> Result<String> {
    if service.is_empty() {
        return Err(Error::validation("service name must not be empty"));
    }
    let zone = zone.trim_matches('.');
    if zone.is_empty() {
        return Err(Error::config(HOSTED_ZONE_ENV, "must not be empty"));
    }
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::validation(format!("clock before unix epoch: {e}")))?
        .as_secs();
    Ok(format!("{service}-{secs}.{zone}"))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| Error::config(key, format!("'{value}' is not a number: {e}")))
}
