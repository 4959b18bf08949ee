//! RouteGroup CRD
//!
//! A RouteGroup declares hosts, backends and routes for the skipper ingress.
//! The routegroup controller provisions a load balancer for it and writes the
//! load balancer address into `status.loadBalancer.routeGroup`. That status
//! field starts empty and is the signal the status watcher polls for.

use std::collections::BTreeMap;

use kube::api::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// RouteGroup routes HTTP traffic for a set of hosts to backends.
///
/// Example:
/// ```yaml
/// apiVersion: zalando.org/v1
/// kind: RouteGroup
/// metadata:
///   name: rg-test
/// spec:
///   hosts:
///     - rg-test-1700000000.example.org
///   backends:
///     - name: rg-test
///       type: service
///       serviceName: rg-test
///       servicePort: 83
///   defaultBackends:
///     - backendName: rg-test
///   routes:
///     - pathSubtree: /
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "zalando.org",
    version = "v1",
    kind = "RouteGroup",
    namespaced,
    status = "RouteGroupStatus",
    shortname = "rg",
    printcolumn = r#"{"name":"Hosts","type":"string","jsonPath":".spec.hosts"}"#,
    printcolumn = r#"{"name":"Address","type":"string","jsonPath":".status.loadBalancer.routeGroup[*].hostname"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroupSpec {
    /// Hostnames this RouteGroup serves
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Backends routes can refer to by name
    #[serde(default)]
    pub backends: Vec<RouteGroupBackend>,

    /// Backends used by routes that do not name their own
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_backends: Vec<RouteGroupBackendReference>,

    /// Routes, evaluated by the proxy in specificity order
    #[serde(default)]
    pub routes: Vec<RouteGroupRouteSpec>,
}

/// Kind of backend a route forwards to
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// A Kubernetes Service
    #[default]
    Service,
    /// Responds from the proxy itself (filters produce the response)
    Shunt,
    /// Re-evaluates the routing table
    Loopback,
    /// Forwards to the address set by a filter
    Dynamic,
    /// Load balances over a fixed endpoint list
    Lb,
    /// Forwards to a fixed network address
    Network,
}

/// A named backend
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroupBackend {
    /// Name routes use to refer to this backend
    pub name: String,

    /// Backend kind
    #[serde(rename = "type")]
    pub type_: BackendType,

    /// Target address for `network` backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Balancing algorithm for `lb` and `service` backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,

    /// Endpoint list for `lb` backends
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<String>,

    /// Service name for `service` backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Service port for `service` backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_port: Option<i32>,
}

impl RouteGroupBackend {
    /// A backend forwarding to a Kubernetes Service port
    pub fn service(name: impl Into<String>, service_name: impl Into<String>, port: i32) -> Self {
        Self {
            name: name.into(),
            type_: BackendType::Service,
            service_name: Some(service_name.into()),
            service_port: Some(port),
            ..Default::default()
        }
    }

    /// A backend answered by the proxy itself
    pub fn shunt(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: BackendType::Shunt,
            ..Default::default()
        }
    }
}

/// Reference to a backend with a traffic weight
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroupBackendReference {
    /// Name of a backend declared in `spec.backends`
    pub backend_name: String,

    /// Relative weight when several backends share a route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

impl RouteGroupBackendReference {
    /// Reference a backend with the given weight
    pub fn weighted(backend_name: impl Into<String>, weight: i32) -> Self {
        Self {
            backend_name: backend_name.into(),
            weight: Some(weight),
        }
    }
}

/// One route: path matching, predicates, filters and backends
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroupRouteSpec {
    /// Exact path match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Path prefix match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_subtree: Option<String>,

    /// Path regular expression match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_regexp: Option<String>,

    /// Backends for this route; falls back to `defaultBackends` when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<RouteGroupBackendReference>,

    /// Skipper filters, e.g. `status(201)`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,

    /// Skipper predicates, e.g. `Header("Foo", "bar")`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<String>,

    /// Allowed HTTP methods; all methods when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

impl RouteGroupRouteSpec {
    /// A route matching everything below `prefix`
    pub fn path_subtree(prefix: impl Into<String>) -> Self {
        Self {
            path_subtree: Some(prefix.into()),
            ..Default::default()
        }
    }
}

/// RouteGroup status, written by the routegroup controller
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroupStatus {
    /// Provisioned load balancer
    #[serde(default)]
    pub load_balancer: RouteGroupLoadBalancerStatus,
}

/// Load balancer section of the RouteGroup status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroupLoadBalancerStatus {
    /// Load balancer ingress points; empty until provisioning finishes
    #[serde(default)]
    pub route_group: Vec<LoadBalancerIngress>,
}

/// A single load balancer ingress point
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerIngress {
    /// DNS name of the load balancer (AWS ALB/NLB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// IP address of the load balancer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl LoadBalancerIngress {
    /// Hostname if set, otherwise IP; `None` when both are empty
    pub fn address(&self) -> Option<&str> {
        self.hostname
            .as_deref()
            .filter(|h| !h.is_empty())
            .or_else(|| self.ip.as_deref().filter(|ip| !ip.is_empty()))
    }
}

impl RouteGroupStatus {
    /// The first provisioned load balancer address, if any
    pub fn address(&self) -> Option<&str> {
        self.load_balancer
            .route_group
            .iter()
            .find_map(LoadBalancerIngress::address)
    }
}

impl RouteGroup {
    /// Build a RouteGroup with the given metadata
    pub fn with_metadata(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
        annotations: BTreeMap<String, String>,
        spec: RouteGroupSpec,
    ) -> Self {
        let mut rg = RouteGroup::new(&name.into(), spec);
        rg.metadata = ObjectMeta {
            namespace: Some(namespace.into()),
            labels: Some(labels).filter(|l| !l.is_empty()),
            annotations: Some(annotations).filter(|a| !a.is_empty()),
            ..rg.metadata
        };
        rg
    }

    /// The provisioned load balancer address, if the controller has set one
    pub fn address(&self) -> Option<&str> {
        self.status.as_ref().and_then(RouteGroupStatus::address)
    }
}
