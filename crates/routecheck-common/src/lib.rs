//! Common types for routecheck: the RouteGroup CRD, errors, settings, and utilities
//!
//! # Modules
//!
//! - [`crd`] - The `RouteGroup` custom resource as observed by the probes
//! - [`error`] - Error type shared by the workspace crates
//! - [`retry`] - Backoff retries for cluster writes made by scenarios
//! - [`settings`] - Environment-driven probe settings and hostname generation
//! - [`telemetry`] - Logging initialisation for the binary and test suites

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod retry;
pub mod settings;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group of the RouteGroup CRD
pub const ROUTEGROUP_API_GROUP: &str = "zalando.org";

/// Annotation selecting the load balancer flavour provisioned for a RouteGroup
pub const LOAD_BALANCER_TYPE_ANNOTATION: &str = "zalando.org/aws-load-balancer-type";

/// Label key used to select the pods behind a scenario's service
pub const APP_LABEL: &str = "app";
