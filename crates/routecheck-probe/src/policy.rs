//! Poll policy and the clock polling runs against

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use routecheck_common::settings::ProbeSettings;

use crate::error::ProbeError;
use crate::Result;

/// Deadline and fixed interval for one convergence poll.
///
/// The interval must be positive and strictly below the timeout so that more
/// than one attempt happens before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    timeout: Duration,
    interval: Duration,
}

impl PollPolicy {
    /// Build a policy, rejecting intervals that can't produce a second attempt
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ProbeError::invalid_policy("poll interval must be positive"));
        }
        if interval >= timeout {
            return Err(ProbeError::invalid_policy(format!(
                "poll interval {interval:?} must be below timeout {timeout:?}"
            )));
        }
        Ok(Self { timeout, interval })
    }

    /// Stage timeout and poll interval from loaded settings
    pub fn from_settings(settings: &ProbeSettings) -> Result<Self> {
        Self::new(settings.stage_timeout, settings.poll_interval)
    }

    /// Total time one poll may take
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait between attempts
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Time source for polling loops.
///
/// Production code uses [`SystemClock`]; tests use [`ManualClock`] to run
/// ten-minute deadlines instantly.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;

    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by tokio's timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated time: `sleep` advances the clock and returns immediately.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    offset: Duration,
    sleeps: u32,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// A clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Move time forward without counting a sleep
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.offset += duration;
    }

    /// Simulated time since construction
    pub fn elapsed(&self) -> Duration {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).offset
    }

    /// Number of sleeps performed
    pub fn sleep_count(&self) -> u32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).sleeps
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.offset += duration;
        state.sleeps += 1;
    }
}
