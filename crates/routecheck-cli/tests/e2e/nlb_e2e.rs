//! NLB RouteGroup: the load balancer type annotation selects an NLB
//!
//! ```bash
//! cargo test --features provider-e2e --test e2e test_nlb_routegroup_e2e -- --nocapture
//! ```

#![cfg(feature = "provider-e2e")]

use std::collections::BTreeMap;

use routecheck_common::crd::RouteGroupRouteSpec;
use routecheck_common::LOAD_BALANCER_TYPE_ANNOTATION;
use routecheck_probe::{BodyEquals, IsSuccess};

use super::helpers::{routegroup, run_scenario};

#[tokio::test]
async fn test_nlb_routegroup_e2e() {
    run_scenario("rg-test-nlb", |scenario| async move {
        let annotations =
            BTreeMap::from([(LOAD_BALANCER_TYPE_ANNOTATION.to_string(), "nlb".to_string())]);
        let rg = routegroup(
            &scenario.service,
            &scenario.namespace,
            &scenario.hostname,
            annotations,
            vec![RouteGroupRouteSpec::path_subtree("/")],
        );
        scenario
            .deploy(r#"rHealth: Path("/") -> inlineContent("OK") -> <shunt>"#, rg)
            .await?;

        scenario
            .expect("hostname serves", &scenario.https("/"), &IsSuccess)
            .await?;
        scenario
            .expect("health body", &scenario.https("/"), &BodyEquals::new("OK"))
            .await
            .map(drop)
    })
    .await;
}
