//! Probe targets
//!
//! A target is everything needed to issue one request: host, scheme, path,
//! method, injected headers, TLS verification mode and redirect handling.
//! Targets are constructed per assertion and validated before the first
//! request, so a malformed target fails immediately instead of being polled
//! until the deadline.

use std::fmt;
use std::str::FromStr;

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::ProbeError;
use crate::Result;

/// URL scheme of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain HTTP
    Http,
    /// HTTP over TLS
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}

impl FromStr for Scheme {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(ProbeError::invalid_target(
                other,
                "scheme must be http or https",
            )),
        }
    }
}

/// HTTP method of a probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET, reads the body
    #[default]
    Get,
    /// HEAD, status and headers only
    Head,
}

impl Method {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Head => reqwest::Method::HEAD,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Head => f.write_str("HEAD"),
        }
    }
}

impl FromStr for Method {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            other => Err(ProbeError::invalid_target(
                other,
                "method must be GET or HEAD",
            )),
        }
    }
}

/// What a single probe request is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    host: String,
    scheme: Scheme,
    path: Option<String>,
    skip_verify: bool,
    method: Method,
    headers: Vec<(String, String)>,
    follow_redirects: bool,
}

impl ProbeTarget {
    /// A target with the given scheme and host, `GET /`, verifying TLS,
    /// not following redirects.
    pub fn new(scheme: Scheme, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme,
            path: None,
            skip_verify: false,
            method: Method::Get,
            headers: Vec::new(),
            follow_redirects: false,
        }
    }

    /// Plain HTTP target
    pub fn http(host: impl Into<String>) -> Self {
        Self::new(Scheme::Http, host)
    }

    /// HTTPS target
    pub fn https(host: impl Into<String>) -> Self {
        Self::new(Scheme::Https, host)
    }

    /// Request this path instead of `/`
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Use the given method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Skip TLS certificate verification.
    ///
    /// Needed when probing a load balancer by its own DNS name, which the
    /// certificate (issued for the RouteGroup hosts) does not cover.
    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    /// Follow redirects instead of observing the 3xx itself
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Host (optionally with `:port`)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Scheme
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Request path, `/` when unset
    pub fn request_path(&self) -> &str {
        self.path.as_deref().unwrap_or("/")
    }

    /// Whether TLS verification is skipped
    pub fn skips_verify(&self) -> bool {
        self.skip_verify
    }

    /// Request method
    pub fn request_method(&self) -> Method {
        self.method
    }

    /// Injected headers
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whether redirects are followed
    pub fn follows_redirects(&self) -> bool {
        self.follow_redirects
    }

    /// Full request URL
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.request_path())
    }

    /// Reject targets that can never produce a meaningful observation.
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ProbeError::invalid_target(&self.host, "host must not be empty"));
        }
        if host.contains("://") || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(ProbeError::invalid_target(
                &self.host,
                "host must be a bare hostname, optionally with a port",
            ));
        }
        if let Some(path) = &self.path {
            if !path.starts_with('/') {
                return Err(ProbeError::invalid_target(
                    self.url(),
                    format!("path '{path}' must start with '/'"),
                ));
            }
        }
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ProbeError::invalid_target(self.url(), format!("header name '{name}': {e}"))
            })?;
            HeaderValue::from_str(value).map_err(|e| {
                ProbeError::invalid_target(self.url(), format!("header '{name}' value: {e}"))
            })?;
        }
        reqwest::Url::parse(&self.url())
            .map_err(|e| ProbeError::invalid_target(self.url(), format!("not a valid URL: {e}")))?;
        Ok(())
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url())?;
        for (name, value) in &self.headers {
            write!(f, " [{name}: {value}]")?;
        }
        Ok(())
    }
}
