//! Predicates: classify one observation as Pending, Accepted or Rejected
//!
//! Predicates are pure values. Transport errors (connection refused, no such
//! host, TLS failures, timeouts) are always Pending: they are the normal
//! state of a pipeline whose load balancer or DNS record does not exist yet.
//! Only a predicate that knows a state can never recover returns Rejected.

use std::fmt;

use crate::observation::Observation;

/// Verdict of a predicate on one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Not converged yet; poll again
    Pending,
    /// Converged; stop with success
    Accepted,
    /// Can never converge; stop with failure
    Rejected,
}

impl Classification {
    /// Whether polling should stop
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Classifies observations of a probed endpoint.
pub trait Predicate: Send + Sync + fmt::Debug {
    /// Short description for logs and error messages
    fn describe(&self) -> String;

    /// Classify one observation
    fn classify(&self, observation: &Observation) -> Classification;
}

fn is_2xx(status: u16) -> bool {
    (200..300).contains(&status)
}

fn is_3xx(status: u16) -> bool {
    (300..400).contains(&status)
}

/// Accepts a 3xx response that carries a `Location` header.
///
/// The lenient form (the default) treats any other response as Pending: the
/// proxy may answer before the redirect route is programmed. The strict form
/// rejects definitive non-redirect answers (2xx, 4xx, 5xx) for scenarios where
/// the redirect is the only acceptable outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsRedirect {
    strict: bool,
}

impl IsRedirect {
    /// Keep polling on non-redirect responses
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Reject definitive non-redirect responses
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl Predicate for IsRedirect {
    fn describe(&self) -> String {
        if self.strict {
            "redirect (strict)".to_string()
        } else {
            "redirect".to_string()
        }
    }

    fn classify(&self, observation: &Observation) -> Classification {
        let Some(response) = observation.response() else {
            return Classification::Pending;
        };
        if is_3xx(response.status) {
            return match response.location.as_deref() {
                Some(location) if !location.is_empty() => Classification::Accepted,
                _ => Classification::Pending,
            };
        }
        if self.strict && response.status >= 200 {
            Classification::Rejected
        } else {
            Classification::Pending
        }
    }
}

/// Accepts exactly HTTP 404.
///
/// A 404 from the load balancer address proves the load balancer and the
/// proxy behind it are up, even though no route matches the bare address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsNotFound;

impl Predicate for IsNotFound {
    fn describe(&self) -> String {
        "not found (404)".to_string()
    }

    fn classify(&self, observation: &Observation) -> Classification {
        match observation.status_code() {
            Some(404) => Classification::Accepted,
            _ => Classification::Pending,
        }
    }
}

/// Accepts any 2xx response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsSuccess;

impl Predicate for IsSuccess {
    fn describe(&self) -> String {
        "success (2xx)".to_string()
    }

    fn classify(&self, observation: &Observation) -> Classification {
        match observation.status_code() {
            Some(status) if is_2xx(status) => Classification::Accepted,
            _ => Classification::Pending,
        }
    }
}

/// Accepts exactly one status code, e.g. 201 from a `status(201)` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasStatus(pub u16);

impl Predicate for HasStatus {
    fn describe(&self) -> String {
        format!("status {}", self.0)
    }

    fn classify(&self, observation: &Observation) -> Classification {
        if observation.status_code() == Some(self.0) {
            Classification::Accepted
        } else {
            Classification::Pending
        }
    }
}

/// Accepts a 2xx response whose body equals the expected text.
///
/// Used to prove a response came from the scenario's own backend rather than
/// from a default route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyEquals(pub String);

impl BodyEquals {
    /// Expect `body` verbatim
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }
}

impl Predicate for BodyEquals {
    fn describe(&self) -> String {
        format!("2xx with body {:?}", self.0)
    }

    fn classify(&self, observation: &Observation) -> Classification {
        match observation.response() {
            Some(r) if is_2xx(r.status) && r.body.as_deref() == Some(self.0.as_str()) => {
                Classification::Accepted
            }
            _ => Classification::Pending,
        }
    }
}

/// Accepts a response with exactly this body, whatever its status.
///
/// Pair with [`HasStatus`] for answers the proxy serves itself, such as a
/// shunt route returning 418 with inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasBody(pub String);

impl HasBody {
    /// Expect `body` verbatim
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }
}

impl Predicate for HasBody {
    fn describe(&self) -> String {
        format!("body {:?}", self.0)
    }

    fn classify(&self, observation: &Observation) -> Classification {
        match observation.response() {
            Some(r) if r.body.as_deref() == Some(self.0.as_str()) => Classification::Accepted,
            _ => Classification::Pending,
        }
    }
}

/// Combines predicates: Rejected if any rejects, Accepted if all accept.
#[derive(Debug, Default)]
pub struct AllOf(Vec<Box<dyn Predicate>>);

impl AllOf {
    /// Combine the given predicates
    pub fn new(predicates: Vec<Box<dyn Predicate>>) -> Self {
        Self(predicates)
    }

    /// Add one more predicate
    pub fn and(mut self, predicate: impl Predicate + 'static) -> Self {
        self.0.push(Box::new(predicate));
        self
    }
}

impl Predicate for AllOf {
    fn describe(&self) -> String {
        self.0
            .iter()
            .map(|p| p.describe())
            .collect::<Vec<_>>()
            .join(" and ")
    }

    fn classify(&self, observation: &Observation) -> Classification {
        let mut verdict = Classification::Accepted;
        for predicate in &self.0 {
            match predicate.classify(observation) {
                Classification::Rejected => return Classification::Rejected,
                Classification::Pending => verdict = Classification::Pending,
                Classification::Accepted => {}
            }
        }
        verdict
    }
}
