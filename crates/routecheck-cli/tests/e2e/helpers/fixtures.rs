//! Resource literals for the RouteGroup scenarios
#![cfg(feature = "provider-e2e")]

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, Pod, PodSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use routecheck_common::crd::{
    RouteGroup, RouteGroupBackend, RouteGroupBackendReference, RouteGroupRouteSpec,
    RouteGroupSpec,
};
use routecheck_common::APP_LABEL;

use super::{SERVICE_PORT, SKIPPER_IMAGE, TARGET_PORT};

/// Name of the shunt backend routes use to answer from the proxy itself
pub const ROUTER_BACKEND: &str = "router";

/// Skipper routes answering `/` with `OK` and `/backend` with `body`
pub fn health_and_backend_routes(body: &str) -> String {
    format!(
        "rHealth: Path(\"/\") -> inlineContent(\"OK\") -> <shunt>;\n\
         rBackend: Path(\"/backend\") -> inlineContent(\"{body}\") -> <shunt>;"
    )
}

/// `app: <service>`
pub fn app_labels(service: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), service.to_string())])
}

pub fn backend_pod_name(service: &str) -> String {
    format!("{service}-backend")
}

/// ClusterIP Service forwarding `SERVICE_PORT` to the skipper Pod
pub fn service(name: &str, namespace: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(app_labels(name)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(app_labels(name)),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: SERVICE_PORT,
                target_port: Some(IntOrString::Int(TARGET_PORT)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Skipper Pod answering with `inline_routes` on `TARGET_PORT`
pub fn skipper_pod(service: &str, namespace: &str, inline_routes: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(backend_pod_name(service)),
            namespace: Some(namespace.to_string()),
            labels: Some(app_labels(service)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "skipper".to_string(),
                image: Some(SKIPPER_IMAGE.clone()),
                args: Some(vec![
                    "skipper".to_string(),
                    "-inline-routes".to_string(),
                    inline_routes.to_string(),
                    "-address".to_string(),
                    format!(":{TARGET_PORT}"),
                ]),
                ports: Some(vec![ContainerPort {
                    container_port: TARGET_PORT,
                    name: Some("http".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// RouteGroup for `hostname` with the scenario's Service as default backend
/// and a shunt `router` backend available to `routes`.
pub fn routegroup(
    service: &str,
    namespace: &str,
    hostname: &str,
    annotations: BTreeMap<String, String>,
    routes: Vec<RouteGroupRouteSpec>,
) -> RouteGroup {
    RouteGroup::with_metadata(
        service,
        namespace,
        app_labels(service),
        annotations,
        RouteGroupSpec {
            hosts: vec![hostname.to_string()],
            backends: vec![
                RouteGroupBackend::service(service, service, SERVICE_PORT),
                RouteGroupBackend::shunt(ROUTER_BACKEND),
            ],
            default_backends: vec![RouteGroupBackendReference::weighted(service, 1)],
            routes,
        },
    )
}

/// Route under `prefix` answered by the shunt backend after `filters`
pub fn shunt_route(prefix: &str, filters: &[&str]) -> RouteGroupRouteSpec {
    RouteGroupRouteSpec {
        filters: filters.iter().map(|f| f.to_string()).collect(),
        backends: vec![RouteGroupBackendReference::weighted(ROUTER_BACKEND, 1)],
        ..RouteGroupRouteSpec::path_subtree(prefix)
    }
}
