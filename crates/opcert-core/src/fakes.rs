//! In-process fakes for external collaborators (testing only)
//!
//! Provides `FakeScorecardRunner`, which satisfies the `ScorecardRunner`
//! contract without a cluster or an `operator-sdk` binary.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScorecardError;
use crate::scorecard::report::{
    ScorecardReport, ScorecardTest, TestResult, TestSpec, TestState, TestStatus,
};
use crate::scorecard::runner::{ScorecardRequest, ScorecardRunner};

#[derive(Debug, Clone)]
enum Behavior {
    WriteReport(Vec<u8>),
    Fail { exit_code: i32, stderr: String },
    WriteNothing,
}

/// Scripted scorecard runner.
///
/// Writes a canned report (or fails) after an optional simulated delay, and
/// counts how many times it was invoked. Clones share the counter.
#[derive(Debug, Clone)]
pub struct FakeScorecardRunner {
    behavior: Behavior,
    delay: Option<Duration>,
    invocations: Arc<AtomicUsize>,
}

impl FakeScorecardRunner {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Writes `report` as JSON.
    pub fn from_report(report: &ScorecardReport) -> Self {
        let raw = serde_json::to_vec_pretty(report).unwrap_or_default();
        Self::with_behavior(Behavior::WriteReport(raw))
    }

    /// Writes a report with one item per `(test name, state)` pair.
    pub fn with_results(results: &[(&str, TestState)]) -> Self {
        Self::from_report(&report_with_results(results))
    }

    /// Writes a report in which every named test passed.
    pub fn passing(tests: &[&str]) -> Self {
        let results: Vec<(&str, TestState)> =
            tests.iter().map(|name| (*name, TestState::Pass)).collect();
        Self::with_results(&results)
    }

    /// Writes `raw` verbatim as the report.
    pub fn with_raw_report(raw: Vec<u8>) -> Self {
        Self::with_behavior(Behavior::WriteReport(raw))
    }

    /// Fails as if the tool exited with `exit_code`.
    pub fn failing(exit_code: i32, stderr: &str) -> Self {
        Self::with_behavior(Behavior::Fail {
            exit_code,
            stderr: stderr.to_string(),
        })
    }

    /// Succeeds without writing a report.
    pub fn silent() -> Self {
        Self::with_behavior(Behavior::WriteNothing)
    }

    /// Simulated tool run time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

/// Build a report with one test item per `(name, state)` pair.
pub fn report_with_results(results: &[(&str, TestState)]) -> ScorecardReport {
    let items = results
        .iter()
        .map(|(name, state)| ScorecardTest {
            kind: "Test".to_string(),
            api_version: "scorecard.operatorframework.io/v1alpha3".to_string(),
            spec: TestSpec {
                image: "quay.io/operator-framework/scorecard-test:latest".to_string(),
                entrypoint: vec!["scorecard-test".to_string(), name.to_string()],
                labels: BTreeMap::from([("test".to_string(), format!("{name}-test"))]),
            },
            status: TestStatus {
                results: vec![TestResult {
                    name: name.to_string(),
                    state: *state,
                    log: format!("{name} finished with state {}", state.as_str()),
                    errors: Vec::new(),
                    suggestions: Vec::new(),
                }],
            },
        })
        .collect();

    ScorecardReport {
        kind: "TestList".to_string(),
        api_version: "scorecard.operatorframework.io/v1alpha3".to_string(),
        items,
    }
}

#[async_trait]
impl ScorecardRunner for FakeScorecardRunner {
    async fn run(&self, request: &ScorecardRequest) -> Result<(), ScorecardError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::WriteReport(raw) => {
                std::fs::write(request.result_path(), raw)?;
                Ok(())
            }
            Behavior::Fail { exit_code, stderr } => Err(ScorecardError::ToolFailed {
                exit_code: *exit_code,
                stderr: stderr.clone(),
            }),
            Behavior::WriteNothing => Ok(()),
        }
    }
}
