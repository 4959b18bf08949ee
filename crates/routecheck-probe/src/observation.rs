//! One observation of a probed endpoint
//!
//! An observation is either an HTTP response (any status) or a transport
//! error. Transport errors are expected while DNS, the load balancer and TLS
//! certificates are still being provisioned, so they are recorded with a
//! coarse kind rather than treated as failures.

use std::error::Error as StdError;
use std::fmt;

/// Characters of a response body shown when an observation is displayed
const BODY_EXCERPT_CHARS: usize = 80;

/// An HTTP response as seen by a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// `Location` header, if present
    pub location: Option<String>,
    /// Response body (truncated), absent for HEAD requests
    pub body: Option<String>,
}

/// Coarse category of a request that produced no HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransportErrorKind {
    /// Nothing listening at the resolved address yet
    ConnectionRefused,
    /// Hostname does not resolve (DNS record not published yet)
    DnsNotFound,
    /// TLS handshake or certificate failure
    Tls,
    /// Request or connect timeout
    Timeout,
    /// Other connection establishment failure
    Connect,
    /// Anything else (body read failures, protocol errors)
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ConnectionRefused => "connection refused",
            Self::DnsNotFound => "no such host",
            Self::Tls => "tls failure",
            Self::Timeout => "timeout",
            Self::Connect => "connect failure",
            Self::Other => "transport failure",
        };
        f.write_str(s)
    }
}

/// A request that failed below HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Category of the failure
    pub kind: TransportErrorKind,
    /// Full error chain rendered as text
    pub message: String,
}

/// Result of issuing one request against a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The server answered
    Response(HttpResponse),
    /// No HTTP response was received
    TransportError(TransportError),
}

impl Observation {
    /// A response with the given status and nothing else
    pub fn status(status: u16) -> Self {
        Self::Response(HttpResponse {
            status,
            location: None,
            body: None,
        })
    }

    /// A redirect response pointing at `location`
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self::Response(HttpResponse {
            status,
            location: Some(location.into()),
            body: None,
        })
    }

    /// A response with a body
    pub fn with_body(status: u16, body: impl Into<String>) -> Self {
        Self::Response(HttpResponse {
            status,
            location: None,
            body: Some(body.into()),
        })
    }

    /// A transport-level failure
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::TransportError(TransportError {
            kind,
            message: message.into(),
        })
    }

    /// Status code, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }

    /// The response, if one was received
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Response(r) => Some(r),
            Self::TransportError(_) => None,
        }
    }

    /// The transport failure, if no response was received
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Response(_) => None,
            Self::TransportError(e) => Some(e),
        }
    }

    /// Whether the request failed below HTTP
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::TransportError(_))
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(r) => {
                write!(f, "HTTP {}", r.status)?;
                if let Some(location) = &r.location {
                    write!(f, " -> {location}")?;
                }
                match r.body.as_deref() {
                    Some(body) if !body.is_empty() => {
                        let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
                        write!(f, " body {excerpt:?}")?;
                        if excerpt.len() < body.len() {
                            f.write_str("...")?;
                        }
                        Ok(())
                    }
                    _ => Ok(()),
                }
            }
            Self::TransportError(e) => write!(f, "{}: {}", e.kind, e.message),
        }
    }
}

/// Categorise an error chain produced by the HTTP stack.
///
/// Walks `source()` looking for an `io::Error` kind first, then falls back to
/// the rendered messages, since resolver and TLS errors are opaque types.
pub fn classify_transport_error(
    err: &(dyn StdError + 'static),
    is_timeout: bool,
    is_connect: bool,
) -> TransportErrorKind {
    if is_timeout {
        return TransportErrorKind::Timeout;
    }

    let mut messages = Vec::new();
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    return TransportErrorKind::ConnectionRefused
                }
                std::io::ErrorKind::TimedOut => return TransportErrorKind::Timeout,
                _ => {}
            }
        }
        messages.push(e.to_string().to_ascii_lowercase());
        current = e.source();
    }

    let text = messages.join(": ");
    if text.contains("connection refused") {
        TransportErrorKind::ConnectionRefused
    } else if text.contains("dns error")
        || text.contains("failed to lookup address")
        || text.contains("name or service not known")
        || text.contains("no such host")
        || text.contains("nodename nor servname")
    {
        TransportErrorKind::DnsNotFound
    } else if text.contains("certificate")
        || text.contains("tls")
        || text.contains("handshake")
        || text.contains("ssl")
    {
        TransportErrorKind::Tls
    } else if text.contains("timed out") {
        TransportErrorKind::Timeout
    } else if is_connect {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    }
}

/// Render an error and all of its sources as one line.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        current = e.source();
    }
    parts.join(": ")
}
