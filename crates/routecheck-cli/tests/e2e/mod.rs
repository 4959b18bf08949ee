//! End-to-end RouteGroup convergence tests
//!
//! Each scenario submits a Service, a skipper Pod answering with inline
//! routes, and a RouteGroup, then waits for the routegroup controller, the
//! load balancer, external-dns and skipper to converge.
//!
//! # Running Tests
//!
//! ```bash
//! KUBECONFIG=/path/to/kubeconfig E2E_HOSTED_ZONE=example.org \
//! cargo test --features provider-e2e --test e2e -- --nocapture
//! ```
//!
//! Each scenario runs in its own namespace, deleted when it ends.


mod alb_e2e;
mod blue_green_e2e;
mod filters_e2e;
mod nlb_e2e;
mod predicates_e2e;
