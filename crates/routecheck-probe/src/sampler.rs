//! Distribution sampling for weighted traffic splits
//!
//! A sampler issues a fixed number of sequential requests and counts each
//! observation under a caller-chosen key. Judging the counts against
//! tolerance bands is a separate step on the finished sample, so one run can
//! be checked against several expectations.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::client::HttpProbe;
use crate::error::ProbeError;
use crate::observation::Observation;
use crate::target::ProbeTarget;
use crate::Result;

/// Default key: the status code, or a single bucket for transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKey {
    /// HTTP status code
    Status(u16),
    /// No HTTP response
    TransportError,
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::TransportError => f.write_str("transport error"),
        }
    }
}

impl FromStr for StatusKey {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("error") || s.eq_ignore_ascii_case("transport") {
            return Ok(Self::TransportError);
        }
        s.parse::<u16>()
            .ok()
            .filter(|code| (100..600).contains(code))
            .map(Self::Status)
            .ok_or_else(|| {
                ProbeError::invalid_sample(format!("'{s}' is not a status code or 'error'"))
            })
    }
}

/// Key observations by status code
pub fn by_status(observation: &Observation) -> StatusKey {
    match observation.status_code() {
        Some(code) => StatusKey::Status(code),
        None => StatusKey::TransportError,
    }
}

/// Inclusive bounds on how often a key may occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleranceBand {
    lower: usize,
    upper: usize,
}

impl ToleranceBand {
    /// Band `[lower, upper]`; inverted bounds are rejected
    pub fn new(lower: usize, upper: usize) -> Result<Self> {
        if lower > upper {
            return Err(ProbeError::invalid_sample(format!(
                "tolerance band {lower}..{upper} is inverted"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Band `[expected - slack, expected + slack]`, floored at zero
    pub fn centered(expected: usize, slack: usize) -> Self {
        Self {
            lower: expected.saturating_sub(slack),
            upper: expected.saturating_add(slack),
        }
    }

    /// Inclusive lower bound
    pub fn lower(&self) -> usize {
        self.lower
    }

    /// Inclusive upper bound
    pub fn upper(&self) -> usize {
        self.upper
    }

    /// Whether `count` lies within the band
    pub fn contains(&self, count: usize) -> bool {
        (self.lower..=self.upper).contains(&count)
    }
}

impl fmt::Display for ToleranceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lower, self.upper)
    }
}

impl FromStr for ToleranceBand {
    type Err = ProbeError;

    /// Parse `LO..HI` or `LO..=HI`, both inclusive
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProbeError::invalid_sample(format!("'{s}' is not a band like 40..60"));
        let (lower, upper) = s.split_once("..").ok_or_else(invalid)?;
        let upper = upper.strip_prefix('=').unwrap_or(upper);
        let lower = lower.trim().parse().map_err(|_| invalid())?;
        let upper = upper.trim().parse().map_err(|_| invalid())?;
        Self::new(lower, upper)
    }
}

/// Occurrence counts from one sampler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSample<K: Ord> {
    counts: BTreeMap<K, usize>,
    total: usize,
}

impl<K: Ord> DistributionSample<K> {
    /// Build a sample from observed keys
    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let mut counts = BTreeMap::new();
        let mut total = 0;
        for key in keys {
            *counts.entry(key).or_insert(0) += 1;
            total += 1;
        }
        Self { counts, total }
    }

    /// Occurrences of `key`; zero if never seen
    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of observations
    pub fn total(&self) -> usize {
        self.total
    }

    /// All observed keys and their counts
    pub fn counts(&self) -> &BTreeMap<K, usize> {
        &self.counts
    }
}

impl<K: Ord + fmt::Display> DistributionSample<K> {
    /// Fail if `key` occurred outside `band`
    pub fn check(&self, key: &K, band: &ToleranceBand) -> Result<()> {
        let count = self.count(key);
        if band.contains(count) {
            return Ok(());
        }
        Err(ProbeError::DistributionOutOfBand {
            key: key.to_string(),
            count,
            total: self.total,
            lower: band.lower(),
            upper: band.upper(),
        })
    }

    /// Check every expectation, stopping at the first violation
    pub fn verify<'a>(
        &self,
        expectations: impl IntoIterator<Item = (&'a K, &'a ToleranceBand)>,
    ) -> Result<()>
    where
        K: 'a,
    {
        for (key, band) in expectations {
            self.check(key, band)?;
        }
        Ok(())
    }
}

impl<K: Ord + fmt::Display> fmt::Display for DistributionSample<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} samples:", self.total)?;
        for (key, count) in &self.counts {
            write!(f, " {key}={count}")?;
        }
        Ok(())
    }
}

/// Issues a fixed number of sequential requests and tallies them.
#[derive(Clone)]
pub struct DistributionSampler {
    probe: Arc<dyn HttpProbe>,
}

impl DistributionSampler {
    /// Sample through `probe`
    pub fn new(probe: Arc<dyn HttpProbe>) -> Self {
        Self { probe }
    }

    /// Issue exactly `n` requests against `target`, keyed by `key_fn`.
    ///
    /// Requests run one after another with no pause; transport errors are
    /// observations like any other and get a key of their own.
    pub async fn sample<K, F>(
        &self,
        target: &ProbeTarget,
        n: usize,
        key_fn: F,
    ) -> Result<DistributionSample<K>>
    where
        K: Ord + fmt::Display,
        F: Fn(&Observation) -> K,
    {
        if n == 0 {
            return Err(ProbeError::invalid_sample("sample size must be positive"));
        }
        target.validate()?;

        let mut keys = Vec::with_capacity(n);
        for i in 0..n {
            let observation = self.probe.observe(target).await;
            let key = key_fn(&observation);
            debug!(probe = %target, sample = i + 1, key = %key, "sampled");
            keys.push(key);
        }

        let sample = DistributionSample::from_keys(keys);
        info!(probe = %target, result = %sample, "sampling complete");
        Ok(sample)
    }
}
