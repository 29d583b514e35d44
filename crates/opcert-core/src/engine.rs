//! Contract between the checks and the host that runs them.
//!
//! The host owns registration, sequencing and aggregation; this module only
//! fixes the shape of what it exposes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::check::{Check, Finding, HelpText, Metadata, Verdict, VerdictStatus};
use crate::error::Result;

/// Reportable outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: String,
    pub reason: Option<String>,
    pub findings: Vec<Finding>,
    pub metadata: Metadata,
    pub help: HelpText,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl CheckResult {
    /// Capture everything the reporter needs from a finished evaluation.
    pub fn from_verdict(
        check: &dyn Check,
        verdict: Verdict,
        started_at: DateTime<Utc>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            name: check.name().to_string(),
            status: verdict.status.label().to_string(),
            help: check.help(&verdict.status),
            metadata: check.metadata(),
            reason: verdict.reason,
            findings: verdict.findings,
            started_at,
            elapsed_ms,
        }
    }
}

/// Aggregated results of one run, bucketed by status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub passed: Vec<CheckResult>,
    pub failed: Vec<CheckResult>,
    pub not_applicable: Vec<CheckResult>,
    pub errors: Vec<CheckResult>,
}

impl Results {
    /// File the outcome of `check` under the bucket matching its status.
    pub fn record(
        &mut self,
        check: &dyn Check,
        verdict: Verdict,
        started_at: DateTime<Utc>,
        elapsed_ms: u64,
    ) {
        let bucket = match &verdict.status {
            VerdictStatus::Passed => &mut self.passed,
            VerdictStatus::Failed => &mut self.failed,
            VerdictStatus::NotApplicable => &mut self.not_applicable,
            VerdictStatus::Errored { .. } => &mut self.errors,
        };
        bucket.push(CheckResult::from_verdict(check, verdict, started_at, elapsed_ms));
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.not_applicable.len() + self.errors.len()
    }

    /// True when nothing failed or errored. Not-applicable checks do not count against a run.
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty() && self.errors.is_empty()
    }
}

/// Runs a set of checks against one bundle and exposes the aggregated results.
#[async_trait]
pub trait CheckEngine: Send {
    async fn execute_checks(&mut self) -> Result<()>;

    fn results(&self) -> &Results;
}
