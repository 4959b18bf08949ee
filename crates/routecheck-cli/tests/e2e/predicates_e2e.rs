//! RouteGroup route with method and header predicates
//!
//! ```bash
//! cargo test --features provider-e2e --test e2e test_predicates_routegroup_e2e -- --nocapture
//! ```

#![cfg(feature = "provider-e2e")]

use std::collections::BTreeMap;

use routecheck_common::crd::RouteGroupRouteSpec;
use routecheck_probe::{BodyEquals, IsNotFound, IsSuccess};

use super::helpers::{health_and_backend_routes, routegroup, run_scenario};

const EXPECTED_BODY: &str = "OK RG predicate";

#[tokio::test]
async fn test_predicates_routegroup_e2e() {
    run_scenario("rg-test-pred", |scenario| async move {
        let rg = routegroup(
            &scenario.service,
            &scenario.namespace,
            &scenario.hostname,
            BTreeMap::new(),
            vec![
                RouteGroupRouteSpec::path_subtree("/"),
                RouteGroupRouteSpec {
                    methods: vec!["GET".to_string()],
                    predicates: vec![r#"Header("Foo", "bar")"#.to_string()],
                    ..RouteGroupRouteSpec::path_subtree("/backend")
                },
            ],
        );
        scenario
            .deploy(&health_and_backend_routes(EXPECTED_BODY), rg)
            .await?;

        scenario
            .expect("hostname serves", &scenario.https("/"), &IsSuccess)
            .await?;
        scenario
            .expect("health body", &scenario.https("/"), &BodyEquals::new("OK"))
            .await?;

        // Without the header no route matches
        scenario
            .expect(
                "backend without header",
                &scenario.https("/backend"),
                &IsNotFound,
            )
            .await?;
        scenario
            .expect(
                "backend with header",
                &scenario.https("/backend").header("Foo", "bar"),
                &BodyEquals::new(EXPECTED_BODY),
            )
            .await?;
        Ok(())
    })
    .await;
}
