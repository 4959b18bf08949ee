//! Error types for the CLI

use routecheck_probe::ProbeError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A probe, watcher or sampler failed, or a stage did not converge
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Settings, telemetry or cluster setup failed
    #[error(transparent)]
    Common(#[from] routecheck_common::Error),

    /// Kubernetes API error outside a watched stage
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),

    /// Command-line arguments that cannot be used together or at all
    #[error("validation error: {message}")]
    Validation {
        /// What is wrong with the arguments
        message: String,
    },

    /// A command ran but its checks did not pass
    #[error("command failed: {message}")]
    CommandFailed {
        /// Which checks failed
        message: String,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create a command-failed error
    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }

    /// Stage that failed, if the failure came from a convergence stage
    pub fn stage(&self) -> Option<&str> {
        match self {
            Error::Probe(e) => e.stage(),
            _ => None,
        }
    }
}
