//! Error types shared across routecheck crates
//!
//! Errors carry the resource or setting they concern so that a failed
//! scenario can be traced back to the object that misbehaved.

use thiserror::Error;

/// Default context value when no specific resource is known
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for routecheck operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A resource reference or spec is malformed
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// Resource the invalid input refers to (e.g. "default/rg-test")
        resource: String,
        /// Description of what's invalid
        message: String,
    },

    /// A setting could not be parsed or is missing
    #[error("invalid setting {key}: {message}")]
    Config {
        /// Environment variable or flag name
        key: String,
        /// Description of what's wrong
        message: String,
    },

    /// Logging could not be initialised
    #[error("telemetry error: {message}")]
    Telemetry {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a validation error without resource context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a validation error for a specific resource
    pub fn validation_for(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error for the given key
    pub fn config(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a telemetry error with the given message
    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry {
            message: msg.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Kubernetes errors are retryable unless the API answered with a 4xx.
    /// Validation and configuration errors need a fix from the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::Validation { .. } => false,
            Error::Config { .. } => false,
            Error::Telemetry { .. } => false,
        }
    }

    /// Whether this is a Kubernetes 404 (the resource does not exist yet)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Kube {
                source: kube::Error::Api(ae)
            } if ae.code == 404
        )
    }
}
