//! ALB RouteGroup: address, redirect, load balancer and DNS convergence
//!
//! ```bash
//! cargo test --features provider-e2e --test e2e test_alb_routegroup_e2e -- --nocapture
//! ```

#![cfg(feature = "provider-e2e")]

use std::collections::BTreeMap;

use routecheck_cli::commands::converge::standard_plan;
use routecheck_common::crd::RouteGroupRouteSpec;
use tracing::info;

use super::helpers::{routegroup, run_scenario};

const EXPECTED_BODY: &str = "OK RG1";

#[tokio::test]
async fn test_alb_routegroup_e2e() {
    run_scenario("rg-test", |scenario| async move {
        let inline_routes = format!("r0: * -> inlineContent(\"{EXPECTED_BODY}\") -> <shunt>");
        let rg = routegroup(
            &scenario.service,
            &scenario.namespace,
            &scenario.hostname,
            BTreeMap::new(),
            vec![RouteGroupRouteSpec::path_subtree("/")],
        );
        let address = scenario.deploy(&inline_routes, rg).await?;

        // http redirect, then 404 from the load balancer, then DNS, then our backend
        let plan = standard_plan(
            &address,
            &scenario.hostname,
            "/",
            Some(EXPECTED_BODY),
            scenario.policy()?,
        );
        let reports = plan
            .run(&scenario.poller())
            .await
            .map_err(|e| e.to_string())?;
        for report in &reports {
            info!("{report}");
        }
        Ok(())
    })
    .await;
}
