//! Run-all-and-report bookkeeping for the checks of one scenario
#![cfg(feature = "provider-e2e")]

use std::time::Duration;

use routecheck_probe::{ProbeError, StageReport};
use tracing::{error, info};

/// Every check of a scenario, converged or not, in the order they ran.
///
/// A failed check does not stop the scenario; [`StageLedger::finish`] fails
/// once at the end, naming each failed stage and how it failed.
pub struct StageLedger {
    suite: String,
    entries: Vec<(String, Result<StageReport, ProbeError>)>,
}

impl StageLedger {
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            entries: Vec::new(),
        }
    }

    /// Record one check as it lands
    pub fn record(&mut self, check: &str, outcome: Result<StageReport, ProbeError>) {
        match &outcome {
            Ok(report) => info!(
                check = %check,
                attempts = report.attempts,
                elapsed_ms = report.elapsed.as_millis() as u64,
                observation = %report.last_observation,
                "check converged"
            ),
            Err(e) => error!(
                check = %check,
                verdict = verdict(e),
                error = %e,
                "check failed"
            ),
        }
        self.entries.push((check.to_string(), outcome));
    }

    /// Log the summary; `Err` lists each failed check with its verdict.
    pub fn finish(self) -> Result<(), String> {
        let mut attempts = 0u32;
        let mut polling = Duration::ZERO;
        let mut failed = Vec::new();

        info!("========================================");
        info!("  {}", self.suite.to_uppercase());
        info!("========================================");
        for (check, outcome) in &self.entries {
            match outcome {
                Ok(report) => {
                    attempts += report.attempts;
                    polling += report.elapsed;
                    info!("  PASS  {report}");
                }
                Err(e) => {
                    info!("  FAIL  {check} ({})", verdict(e));
                    info!("        -> {e}");
                    failed.push(format!("{check} ({})", verdict(e)));
                }
            }
        }
        info!("----------------------------------------");
        info!(
            "  {} converged in {} attempts ({:.1}s polling), {} failed",
            self.entries.len() - failed.len(),
            attempts,
            polling.as_secs_f64(),
            failed.len()
        );
        info!("========================================");

        if failed.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "{} of {} checks failed in {}: {}",
                failed.len(),
                self.entries.len(),
                self.suite,
                failed.join(", ")
            ))
        }
    }
}

fn verdict(err: &ProbeError) -> &'static str {
    match err {
        ProbeError::Rejected { .. } => "rejected",
        e if e.is_timeout() => "timed out",
        e if e.is_misuse() => "invalid check",
        e if e.is_environment() => "client setup",
        _ => "failed",
    }
}
