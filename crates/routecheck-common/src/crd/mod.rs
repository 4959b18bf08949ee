//! Custom Resource Definitions observed by routecheck
//!
//! routecheck never reconciles these resources. It submits them from
//! scenarios and reads their status while the external controllers converge.

mod routegroup;

pub use routegroup::{
    BackendType, LoadBalancerIngress, RouteGroup, RouteGroupBackend, RouteGroupBackendReference,
    RouteGroupLoadBalancerStatus, RouteGroupRouteSpec, RouteGroupSpec, RouteGroupStatus,
};
