//! HTTP probe seam and its reqwest implementation

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use routecheck_common::settings::ProbeSettings;
use tracing::trace;

#[cfg(test)]
use mockall::automock;

use crate::error::ProbeError;
use crate::observation::{classify_transport_error, error_chain, HttpResponse, Observation};
use crate::target::{Method, ProbeTarget};
use crate::Result;

/// Maximum number of redirects followed for targets that follow redirects
const MAX_REDIRECTS: usize = 10;

/// Issues one request against a target and reports what came back.
///
/// Never fails: anything that prevents an HTTP response is reported as an
/// [`Observation::TransportError`] so the caller can classify it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Issue one request
    async fn observe(&self, target: &ProbeTarget) -> Observation;
}

/// Configuration for [`ProbeClient`]
#[derive(Debug, Clone)]
pub struct ProbeClientConfig {
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Static DNS overrides: requests to the domain go to the address
    pub resolve: Vec<(String, SocketAddr)>,
    /// Response bodies are read up to this many bytes; the rest is never
    /// downloaded
    pub max_body_bytes: usize,
}

impl Default for ProbeClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            resolve: Vec::new(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ProbeClientConfig {
    /// Request timeout from loaded settings, other fields default
    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self {
            request_timeout: settings.request_timeout,
            connect_timeout: settings.request_timeout.min(Duration::from_secs(5)),
            ..Self::default()
        }
    }

    /// Send requests for `domain` to `addr` instead of resolving it
    pub fn resolve(mut self, domain: impl Into<String>, addr: SocketAddr) -> Self {
        self.resolve.push((domain.into(), addr));
        self
    }
}

/// reqwest-backed [`HttpProbe`].
///
/// Holds one connection pool per TLS mode and redirect mode, since reqwest
/// fixes both at client construction. Cheap to share across probes.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    verified: reqwest::Client,
    verified_following: reqwest::Client,
    insecure: reqwest::Client,
    insecure_following: reqwest::Client,
    max_body_bytes: usize,
}

impl ProbeClient {
    /// Build the client pools
    pub fn new(config: &ProbeClientConfig) -> Result<Self> {
        Ok(Self {
            verified: build_client(config, false, false)?,
            verified_following: build_client(config, false, true)?,
            insecure: build_client(config, true, false)?,
            insecure_following: build_client(config, true, true)?,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn client_for(&self, target: &ProbeTarget) -> &reqwest::Client {
        match (target.skips_verify(), target.follows_redirects()) {
            (false, false) => &self.verified,
            (false, true) => &self.verified_following,
            (true, false) => &self.insecure,
            (true, true) => &self.insecure_following,
        }
    }
}

fn build_client(
    config: &ProbeClientConfig,
    skip_verify: bool,
    follow_redirects: bool,
) -> Result<reqwest::Client> {
    let redirect = if follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .redirect(redirect)
        .danger_accept_invalid_certs(skip_verify);
    for (domain, addr) in &config.resolve {
        builder = builder.resolve(domain, *addr);
    }

    builder
        .build()
        .map_err(|e| ProbeError::client(error_chain(&e)))
}

fn transport_failure(err: &reqwest::Error) -> Observation {
    let kind = classify_transport_error(err, err.is_timeout(), err.is_connect());
    Observation::transport(kind, error_chain(err))
}

/// Read at most `max` bytes of the body, then drop the connection's remainder
async fn read_body(mut response: reqwest::Response, max: usize) -> reqwest::Result<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = max.saturating_sub(buf.len());
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(truncate_body(&buf, max))
}

fn truncate_body(bytes: &[u8], max: usize) -> String {
    let mut body = String::from_utf8_lossy(bytes).into_owned();
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl HttpProbe for ProbeClient {
    async fn observe(&self, target: &ProbeTarget) -> Observation {
        let mut request = self
            .client_for(target)
            .request(target.request_method().as_reqwest(), target.url());
        for (name, value) in target.headers() {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&e),
        };

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match target.request_method() {
            Method::Head => None,
            Method::Get => match read_body(response, self.max_body_bytes).await {
                Ok(body) => Some(body),
                Err(e) => return transport_failure(&e),
            },
        };

        trace!(probe = %target, status, "probe response");
        Observation::Response(HttpResponse {
            status,
            location,
            body,
        })
    }
}
