//! RouteGroup routes with filters, method predicates and a shunt backend
//!
//! Every check runs even after one fails, then all are reported together.
//!
//! ```bash
//! cargo test --features provider-e2e --test e2e test_filters_routegroup_e2e -- --nocapture
//! ```

#![cfg(feature = "provider-e2e")]

use std::collections::BTreeMap;

use routecheck_common::crd::RouteGroupRouteSpec;
use routecheck_probe::{AllOf, BodyEquals, HasBody, HasStatus, IsNotFound, IsSuccess, Method};

use super::helpers::{
    health_and_backend_routes, routegroup, run_scenario, shunt_route, StageLedger,
};

const EXPECTED_BODY: &str = "OK RG fp";
const TEAPOT_BODY: &str = "I am a teapot";

#[tokio::test]
async fn test_filters_routegroup_e2e() {
    run_scenario("rg-test-fp", |scenario| async move {
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
                    filters: vec!["status(201)".to_string()],
                    ..RouteGroupRouteSpec::path_subtree("/backend")
                },
                RouteGroupRouteSpec {
                    methods: vec!["GET".to_string()],
                    predicates: vec![r#"Method("HEAD")"#.to_string()],
                    ..RouteGroupRouteSpec::path_subtree("/no-match")
                },
                RouteGroupRouteSpec {
                    methods: vec!["GET".to_string(), "HEAD".to_string()],
                    ..RouteGroupRouteSpec::path_subtree("/multi-methods")
                },
                shunt_route(
                    "/router-response",
                    &[r#"status(418) -> inlineContent("I am a teapot")"#],
                ),
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

        let mut ledger = StageLedger::new("RouteGroup filters");

        // =====================================================================
        // Header predicate with status filter
        // =====================================================================
        ledger.record(
            "backend without header",
            scenario
                .check("backend without header", &scenario.https("/backend"), &IsNotFound)
                .await,
        );
        let created = AllOf::default()
            .and(HasStatus(201))
            .and(BodyEquals::new(EXPECTED_BODY));
        ledger.record(
            "backend with header",
            scenario
                .check(
                    "backend with header",
                    &scenario.https("/backend").header("Foo", "bar"),
                    &created,
                )
                .await,
        );

        // =====================================================================
        // Conflicting method predicates never match
        // =====================================================================
        for method in [Method::Get, Method::Head] {
            let check = format!("no-match {method}");
            let target = scenario.https("/no-match").method(method);
            ledger.record(&check, scenario.check(&check, &target, &IsNotFound).await);
        }

        // =====================================================================
        // Several methods on one route
        // =====================================================================
        for method in [Method::Get, Method::Head] {
            let check = format!("multi-methods {method}");
            let target = scenario.https("/multi-methods").method(method);
            ledger.record(&check, scenario.check(&check, &target, &HasStatus(200)).await);
        }

        // =====================================================================
        // Shunt backend answering from the proxy
        // =====================================================================
        let teapot = AllOf::default()
            .and(HasStatus(418))
            .and(HasBody::new(TEAPOT_BODY));
        ledger.record(
            "router response",
            scenario
                .check("router response", &scenario.https("/router-response"), &teapot)
                .await,
        );

        ledger.finish()
    })
    .await;
}
