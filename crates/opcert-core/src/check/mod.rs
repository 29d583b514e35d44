//! Bundle policy checks.
//!
//! Every policy implements [`Check`]: a name, static metadata, an evaluation
//! producing a [`Verdict`], and help text derived from the verdict's status.
//! The set of checks is closed; [`default_checks`] returns all of them.

pub mod related_images;
pub mod restricted_network;
pub mod scorecard_suite;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::bundle::BundleRef;
use crate::error::{CheckError, Result};
use crate::obs;
use crate::scorecard::{ScorecardConfig, ScorecardRunner};

pub use related_images::RelatedImagesCheck;
pub use restricted_network::{RestrictedNetworkCheck, RestrictedNetworkGate};
pub use scorecard_suite::{ScorecardSuite, ScorecardSuiteCheck};

/// How strongly a check is enforced by certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Optional,
    Best,
    Mandatory,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Optional => "optional",
            Level::Best => "best",
            Level::Mandatory => "mandatory",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub description: String,
    pub level: Level,
    pub knowledge_base_url: String,
    pub check_url: String,
}

/// Remediation guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpText {
    pub message: String,
    pub suggestion: String,
}

impl HelpText {
    pub fn new(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// A non-fatal observation reported alongside a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// What the finding is about (an image reference, a test name).
    pub subject: String,
    pub message: String,
}

impl Finding {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Terminal state of one check evaluation.
#[derive(Debug)]
pub enum VerdictStatus {
    Passed,
    /// The bundle violates the policy.
    Failed,
    /// The policy does not apply to this bundle (for example, it never claimed
    /// the feature being checked).
    NotApplicable,
    /// The check could not be evaluated. `fatal` marks failures of external
    /// collaborators as opposed to problems with the bundle itself.
    Errored { error: CheckError, fatal: bool },
}

impl VerdictStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VerdictStatus::Passed => "passed",
            VerdictStatus::Failed => "failed",
            VerdictStatus::NotApplicable => "not_applicable",
            VerdictStatus::Errored { fatal: true, .. } => "errored_fatal",
            VerdictStatus::Errored { fatal: false, .. } => "errored",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, VerdictStatus::Errored { fatal: true, .. })
    }
}

/// Result of evaluating one check against one bundle.
#[derive(Debug)]
pub struct Verdict {
    pub status: VerdictStatus,
    /// Why the verdict is what it is, when there is more to say than the status.
    pub reason: Option<String>,
    pub findings: Vec<Finding>,
}

impl Verdict {
    fn with_status(status: VerdictStatus, reason: Option<String>) -> Self {
        Self {
            status,
            reason,
            findings: Vec::new(),
        }
    }

    pub fn pass() -> Self {
        Self::with_status(VerdictStatus::Passed, None)
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self::with_status(VerdictStatus::Failed, Some(reason.into()))
    }

    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::with_status(VerdictStatus::NotApplicable, Some(reason.into()))
    }

    pub fn error(error: impl Into<CheckError>, fatal: bool) -> Self {
        let error = error.into();
        let reason = error.to_string();
        Self::with_status(VerdictStatus::Errored { error, fatal }, Some(reason))
    }

    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.status, VerdictStatus::Passed)
    }

    /// Collapse into the `(passed, error)` shape: failed and not-applicable
    /// both become `Ok(false)`.
    pub fn into_result(self) -> Result<bool> {
        match self.status {
            VerdictStatus::Passed => Ok(true),
            VerdictStatus::Failed | VerdictStatus::NotApplicable => Ok(false),
            VerdictStatus::Errored { error, .. } => Err(error),
        }
    }
}

/// A bundle policy.
///
/// Implementations hold only immutable configuration and must be safe to
/// evaluate concurrently against the same bundle.
#[async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;

    fn metadata(&self) -> Metadata;

    async fn validate(&self, bundle: &BundleRef) -> Verdict;

    /// Remediation guidance for a verdict with the given status.
    fn help(&self, status: &VerdictStatus) -> HelpText;
}

/// Evaluate `check` inside its own span, logging start, errors and completion.
pub async fn run_check(check: &dyn Check, bundle: &BundleRef) -> Verdict {
    let name = check.name();
    let span = obs::check_span(name, &bundle.image_uri);
    async move {
        let start = Instant::now();
        obs::emit_check_started(name, &bundle.fs_path);

        let verdict = check.validate(bundle).await;

        if let VerdictStatus::Errored { error, fatal } = &verdict.status {
            obs::emit_check_errored(name, error, *fatal);
        }
        obs::emit_check_finished(
            name,
            verdict.status.label(),
            start.elapsed().as_millis() as u64,
        );
        verdict
    }
    .instrument(span)
    .await
}

/// Every check, in evaluation order.
pub fn default_checks(
    runner: Arc<dyn ScorecardRunner>,
    scorecard: ScorecardConfig,
) -> Vec<Box<dyn Check>> {
    vec![
        Box::new(RelatedImagesCheck),
        Box::new(RestrictedNetworkCheck),
        Box::new(ScorecardSuiteCheck::new(
            ScorecardSuite::Olm,
            runner.clone(),
            scorecard.clone(),
        )),
        Box::new(ScorecardSuiteCheck::new(
            ScorecardSuite::Basic,
            runner,
            scorecard,
        )),
    ]
}
