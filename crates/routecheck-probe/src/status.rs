//! Status Watcher: wait for a RouteGroup's load balancer address
//!
//! The routegroup controller writes `status.loadBalancer.routeGroup[]` once the
//! load balancer exists. Until then the resource may be missing (still being
//! admitted), present without a status, or present with an empty ingress list.
//! All three are pending states; only the deadline ends the wait unsuccessfully.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kube::api::GetParams;
use kube::{Api, Client};
use routecheck_common::crd::{RouteGroup, RouteGroupStatus};
use tracing::{info, warn};

#[cfg(test)]
use mockall::automock;

use crate::convergence::{converge, Outcome};
use crate::error::ProbeError;
use crate::policy::{Clock, PollPolicy, SystemClock};
use crate::predicate::Classification;
use crate::Result;

/// Namespaced name of a watched resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    /// Namespace
    pub namespace: String,
    /// Name
    pub name: String,
}

impl ResourceRef {
    /// Reference `namespace/name`
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Reject references that can never resolve
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(ProbeError::invalid_resource(
                self.to_string(),
                "namespace must not be empty",
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ProbeError::invalid_resource(
                self.to_string(),
                "name must not be empty",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Reads the current status of a RouteGroup.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current status; `Ok(None)` when the resource does not exist or has no
    /// status yet
    async fn fetch_status(
        &self,
        resource: &ResourceRef,
    ) -> routecheck_common::Result<Option<RouteGroupStatus>>;
}

/// [`StatusSource`] backed by the Kubernetes API.
///
/// Uses a plain GET with `resourceVersion=0`, served from the API server's
/// watch cache, rather than opening a watch.
#[derive(Clone)]
pub struct KubeStatusSource {
    client: Client,
}

impl KubeStatusSource {
    /// Read through `client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusSource for KubeStatusSource {
    async fn fetch_status(
        &self,
        resource: &ResourceRef,
    ) -> routecheck_common::Result<Option<RouteGroupStatus>> {
        let api: Api<RouteGroup> = Api::namespaced(self.client.clone(), &resource.namespace);
        match api
            .get_with(&resource.name, &GetParams::any())
            .await
            .map_err(routecheck_common::Error::from)
        {
            Ok(rg) => Ok(Some(rg.status.unwrap_or_default())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A provisioned load balancer address and how long it took to appear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedAddress {
    /// Load balancer hostname or IP
    pub address: String,
    /// Status reads issued
    pub attempts: u32,
    /// Time until the address appeared
    pub elapsed: Duration,
}

/// One status read
enum StatusRead {
    Missing,
    Unprovisioned,
    Provisioned(String),
    Failed(String),
}

impl fmt::Display for StatusRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("resource not found"),
            Self::Unprovisioned => f.write_str("no load balancer address"),
            Self::Provisioned(address) => write!(f, "address {address}"),
            Self::Failed(e) => write!(f, "read failed: {e}"),
        }
    }
}

/// Polls a RouteGroup until its load balancer address is set.
#[derive(Clone)]
pub struct StatusWatcher {
    source: Arc<dyn StatusSource>,
    clock: Arc<dyn Clock>,
}

impl StatusWatcher {
    /// Watch with wall-clock time
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    /// Watch with the given clock
    pub fn with_clock(source: Arc<dyn StatusSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    /// Wait until the resource reports a load balancer address.
    ///
    /// Read errors are logged and retried. On deadline the error carries the
    /// last status snapshot seen.
    pub async fn wait_for_address(
        &self,
        resource: &ResourceRef,
        policy: &PollPolicy,
    ) -> Result<ProvisionedAddress> {
        resource.validate()?;
        let label = format!("address of {resource}");
        let source = self.source.as_ref();
        let snapshot: Mutex<Option<RouteGroupStatus>> = Mutex::new(None);
        let last_seen = &snapshot;

        let result = converge(
            self.clock.as_ref(),
            policy,
            &label,
            move || async move {
                match source.fetch_status(resource).await {
                    Ok(None) => StatusRead::Missing,
                    Ok(Some(status)) => {
                        let read = match status.address() {
                            Some(address) => StatusRead::Provisioned(address.to_string()),
                            None => StatusRead::Unprovisioned,
                        };
                        *last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Some(status);
                        read
                    }
                    Err(e) => {
                        warn!(resource = %resource, error = %e, "status read failed, retrying");
                        StatusRead::Failed(e.to_string())
                    }
                }
            },
            |read| match read {
                StatusRead::Provisioned(_) => Classification::Accepted,
                _ => Classification::Pending,
            },
            || {
                StatusRead::Failed("stage deadline reached before the read returned".to_string())
            },
        )
        .await;

        match result.last_observation {
            StatusRead::Provisioned(address) if result.outcome == Outcome::Accepted => {
                info!(
                    resource = %resource,
                    address = %address,
                    attempts = result.attempts,
                    elapsed_ms = result.elapsed.as_millis() as u64,
                    "load balancer address provisioned"
                );
                Ok(ProvisionedAddress {
                    address,
                    attempts: result.attempts,
                    elapsed: result.elapsed,
                })
            }
            last => {
                let last_error = match last {
                    StatusRead::Failed(e) => Some(e),
                    _ => None,
                };
                Err(ProbeError::ProvisioningTimeout {
                    resource: resource.to_string(),
                    attempts: result.attempts,
                    elapsed: result.elapsed,
                    last_status: snapshot
                        .into_inner()
                        .unwrap_or_else(|e| e.into_inner())
                        .map(Box::new),
                    last_error,
                })
            }
        }
    }
}
