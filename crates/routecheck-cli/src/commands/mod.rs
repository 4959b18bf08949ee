//! CLI commands
//!
//! Argument groups shared by several commands live here: where to probe,
//! how long to poll, and how to reach the cluster.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use routecheck_common::settings::{
    ProbeSettings, POLL_INTERVAL_ENV, REQUEST_TIMEOUT_ENV, STAGE_TIMEOUT_ENV,
};
use routecheck_probe::{
    BodyEquals, HasStatus, IsNotFound, IsRedirect, IsSuccess, Method, PollPolicy, Predicate,
    ProbeClient, ProbeClientConfig, ProbeTarget, Scheme,
};

use crate::{Error, Result};

pub mod converge;
pub mod probe;
pub mod sample;
pub mod wait_address;

/// Extension trait to convert errors with Display to CLI Error::CommandFailed.
pub trait CommandErrorExt<T> {
    /// Convert an error to `Error::CommandFailed` using its Display implementation.
    fn cmd_err(self) -> Result<T>;
}

impl<T, E: Display> CommandErrorExt<T> for std::result::Result<T, E> {
    fn cmd_err(self) -> Result<T> {
        self.map_err(|e| Error::command_failed(e.to_string()))
    }
}

/// Polling and request timing
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Timeout of each convergence stage, in seconds
    #[arg(long, env = STAGE_TIMEOUT_ENV, default_value_t = 600)]
    pub timeout_secs: u64,

    /// Pause between attempts, in milliseconds
    #[arg(long, env = POLL_INTERVAL_ENV, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Timeout of a single HTTP request, in seconds
    #[arg(long, env = REQUEST_TIMEOUT_ENV, default_value_t = 10)]
    pub request_timeout_secs: u64,
}

impl PollArgs {
    /// Validated settings for these arguments
    pub fn settings(&self) -> Result<ProbeSettings> {
        let settings = ProbeSettings {
            stage_timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.interval_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ProbeSettings::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Poll policy for one stage
    pub fn policy(&self) -> Result<PollPolicy> {
        Ok(PollPolicy::from_settings(&self.settings()?)?)
    }
}

/// What to request
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Host to probe, optionally with :port
    #[arg(long)]
    pub host: String,

    /// http or https
    #[arg(long, default_value = "https")]
    pub scheme: Scheme,

    /// Request path
    #[arg(long)]
    pub path: Option<String>,

    /// GET or HEAD
    #[arg(long, default_value = "GET")]
    pub method: Method,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Follow redirects instead of observing them
    #[arg(long)]
    pub follow_redirects: bool,

    /// Send requests for DOMAIN to ADDR, as DOMAIN=ADDR (repeatable)
    #[arg(long, value_parser = parse_resolve)]
    pub resolve: Vec<(String, SocketAddr)>,
}

impl TargetArgs {
    /// The probe target described by these arguments
    pub fn target(&self) -> ProbeTarget {
        let mut target = ProbeTarget::new(self.scheme, &self.host)
            .method(self.method)
            .skip_verify(self.insecure)
            .follow_redirects(self.follow_redirects);
        if let Some(path) = &self.path {
            target = target.path(path);
        }
        for (name, value) in &self.headers {
            target = target.header(name, value);
        }
        target
    }

    /// An HTTP client honouring `--resolve` overrides
    pub fn client(&self, settings: &ProbeSettings) -> Result<Arc<ProbeClient>> {
        let mut config = ProbeClientConfig::from_settings(settings);
        for (domain, addr) in &self.resolve {
            config = config.resolve(domain, *addr);
        }
        Ok(Arc::new(ProbeClient::new(&config)?))
    }
}

/// How to reach the cluster
#[derive(Args, Debug, Clone)]
pub struct KubeArgs {
    /// Path to kubeconfig file (default: $KUBECONFIG or ~/.kube/config)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,
}

impl KubeArgs {
    /// Build a kube [`Client`] from the selected kubeconfig and context
    pub async fn client(&self) -> Result<Client> {
        if self.kubeconfig.is_none() && self.context.is_none() {
            return Ok(Client::try_default().await?);
        }

        let kubeconfig = match self.kubeconfig.as_deref() {
            Some(path) => Kubeconfig::read_from(path).map_err(|e| {
                Error::command_failed(format!("failed to read kubeconfig {}: {}", path, e))
            })?,
            None => Kubeconfig::read()
                .map_err(|e| Error::command_failed(format!("failed to read kubeconfig: {}", e)))?,
        };
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .cmd_err()?;
        Client::try_from(config).cmd_err()
    }
}

/// What a probe must observe to succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Any 2xx
    Success,
    /// Exactly 404
    NotFound,
    /// 3xx with a Location, other answers keep polling
    Redirect,
    /// 3xx with a Location, other answers fail immediately
    StrictRedirect,
    /// Exactly this status
    Status(u16),
    /// 2xx with exactly this body
    Body(String),
}

impl Expectation {
    /// The predicate implementing this expectation
    pub fn predicate(&self) -> Box<dyn Predicate> {
        match self {
            Self::Success => Box::new(IsSuccess),
            Self::NotFound => Box::new(IsNotFound),
            Self::Redirect => Box::new(IsRedirect::lenient()),
            Self::StrictRedirect => Box::new(IsRedirect::strict()),
            Self::Status(code) => Box::new(HasStatus(*code)),
            Self::Body(body) => Box::new(BodyEquals::new(body.clone())),
        }
    }
}

impl FromStr for Expectation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(code) = s.strip_prefix("status=") {
            return code
                .parse::<u16>()
                .ok()
                .filter(|c| (100..600).contains(c))
                .map(Self::Status)
                .ok_or_else(|| format!("invalid status code '{code}'"));
        }
        if let Some(body) = s.strip_prefix("body=") {
            return Ok(Self::Body(body.to_string()));
        }
        match s {
            "success" => Ok(Self::Success),
            "not-found" => Ok(Self::NotFound),
            "redirect" => Ok(Self::Redirect),
            "redirect-strict" => Ok(Self::StrictRedirect),
            other => Err(format!(
                "unknown expectation '{other}', expected success, not-found, redirect, \
                 redirect-strict, status=N or body=TEXT"
            )),
        }
    }
}

/// Parse `NAME:VALUE`
pub fn parse_header(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("header '{s}' must be NAME:VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header '{s}' has an empty name"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse `DOMAIN=ADDR`
pub fn parse_resolve(s: &str) -> std::result::Result<(String, SocketAddr), String> {
    let (domain, addr) = s
        .split_once('=')
        .ok_or_else(|| format!("resolve '{s}' must be DOMAIN=IP:PORT"))?;
    let addr = addr
        .parse::<SocketAddr>()
        .map_err(|e| format!("resolve '{s}': {e}"))?;
    Ok((domain.to_string(), addr))
}
