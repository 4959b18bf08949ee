//! Convergence polling and response classification
//!
//! A RouteGroup submitted to a cluster becomes reachable in steps: the
//! controller writes a load balancer address into the status, the proxy starts
//! redirecting plain HTTP, the load balancer answers 404 for unknown hosts, and
//! finally DNS resolves the RouteGroup's hostname to the backend. This crate
//! observes those steps from the outside.
//!
//! # Modules
//!
//! - [`predicate`] - Classify one observation as Pending, Accepted or Rejected
//! - [`target`] - What to request (host, scheme, path, method, headers, TLS mode)
//! - [`policy`] - Poll timeout/interval and the injectable [`Clock`]
//! - [`client`] - The HTTP probe seam and its reqwest implementation
//! - [`convergence`] - The fixed-interval polling primitive and its result
//! - [`poller`] - Poll an HTTP target until a predicate accepts
//! - [`status`] - Poll a RouteGroup until its load balancer address is set
//! - [`sampler`] - Sequential sampling for weighted traffic splits
//! - [`plan`] - Ordered, fail-fast convergence stages
//! - [`error`] - Probe error taxonomy

#![deny(missing_docs)]

pub mod client;
pub mod convergence;
pub mod error;
pub mod observation;
pub mod plan;
pub mod policy;
pub mod poller;
pub mod predicate;
pub mod sampler;
pub mod status;
pub mod target;

pub use client::{HttpProbe, ProbeClient, ProbeClientConfig};
pub use convergence::{ConvergenceResult, Outcome};
pub use error::ProbeError;
pub use observation::{HttpResponse, Observation, TransportError, TransportErrorKind};
pub use plan::{ConvergencePlan, StageReport};
pub use policy::{Clock, ManualClock, PollPolicy, SystemClock};
pub use poller::ResponsePoller;
pub use predicate::{
    AllOf, BodyEquals, Classification, HasBody, HasStatus, IsNotFound, IsRedirect, IsSuccess,
    Predicate,
};
pub use sampler::{by_status, DistributionSample, DistributionSampler, StatusKey, ToleranceBand};
pub use status::{KubeStatusSource, ProvisionedAddress, ResourceRef, StatusSource, StatusWatcher};
pub use target::{Method, ProbeTarget, Scheme};

/// Result type alias using the probe error type
pub type Result<T> = std::result::Result<T, ProbeError>;
