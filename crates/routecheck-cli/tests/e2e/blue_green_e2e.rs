//! Blue-green RouteGroup: two weighted shunt routes split traffic evenly
//!
//! ```bash
//! cargo test --features provider-e2e --test e2e test_blue_green_routegroup_e2e -- --nocapture
//! ```

#![cfg(feature = "provider-e2e")]

use std::collections::BTreeMap;

use routecheck_common::crd::RouteGroupRouteSpec;
use routecheck_probe::{by_status, BodyEquals, IsSuccess, StatusKey, ToleranceBand};
use tracing::info;

use super::helpers::{health_and_backend_routes, routegroup, run_scenario, shunt_route};

#[tokio::test]
async fn test_blue_green_routegroup_e2e() {
    run_scenario("rg-test-bg", |scenario| async move {
        let rg = routegroup(
            &scenario.service,
            &scenario.namespace,
            &scenario.hostname,
            BTreeMap::new(),
            vec![
                RouteGroupRouteSpec::path_subtree("/"),
                shunt_route("/blue-green", &[r#"status(201) -> inlineContent("blue")"#]),
                shunt_route("/blue-green", &[r#"status(202) -> inlineContent("green")"#]),
            ],
        );
        scenario
            .deploy(&health_and_backend_routes("OK RG bg"), rg)
            .await?;

        scenario
            .expect("hostname serves", &scenario.https("/"), &IsSuccess)
            .await?;
        scenario
            .expect("health body", &scenario.https("/"), &BodyEquals::new("OK"))
            .await?;
        scenario
            .expect("blue-green answers", &scenario.https("/blue-green"), &IsSuccess)
            .await?;

        // Equal weights: each colour gets half of the samples, give or take 10%
        let samples = scenario.settings.samples;
        let band = ToleranceBand::centered(samples / 2, samples / 10);
        let sample = scenario
            .sampler()
            .sample(&scenario.https("/blue-green"), samples, by_status)
            .await
            .map_err(|e| e.to_string())?;
        info!(sample = %sample, band = %band, "blue-green distribution");

        sample
            .verify([
                (&StatusKey::Status(201), &band),
                (&StatusKey::Status(202), &band),
            ])
            .map_err(|e| e.to_string())
    })
    .await;
}
