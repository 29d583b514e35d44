//! operator-sdk scorecard suites as checks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::bundle::BundleRef;
use crate::check::{Check, Finding, HelpText, Level, Metadata, Verdict, VerdictStatus};
use crate::scorecard::{ScorecardConfig, ScorecardConsumer, ScorecardReport, ScorecardRunner};

const SCORECARD_OVERVIEW_URL: &str =
    "https://sdk.operatorframework.io/docs/testing-operators/scorecard/#overview";

/// The scorecard suites run as checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScorecardSuite {
    Olm,
    Basic,
}

impl ScorecardSuite {
    pub const ALL: [ScorecardSuite; 2] = [ScorecardSuite::Olm, ScorecardSuite::Basic];

    /// Whether `name` is the check name of one of the suites.
    pub fn is_suite_check(name: &str) -> bool {
        Self::ALL.iter().any(|suite| suite.check_name() == name)
    }

    pub fn check_name(&self) -> &'static str {
        match self {
            ScorecardSuite::Olm => "ScorecardOlmSuiteCheck",
            ScorecardSuite::Basic => "ScorecardBasicSpecCheck",
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            ScorecardSuite::Olm => "suite=olm",
            ScorecardSuite::Basic => "suite=basic",
        }
    }

    /// Report file name inside the artifacts directory.
    pub fn result_file(&self) -> &'static str {
        match self {
            ScorecardSuite::Olm => "operator_bundle_scorecard_OlmSuiteCheck.json",
            ScorecardSuite::Basic => "operator_bundle_scorecard_BasicSpecCheck.json",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ScorecardSuite::Olm => "Operator-sdk scorecard OLM Test Suite Check",
            ScorecardSuite::Basic => {
                "Check to make sure that all CRs have a spec block and that the operator-sdk scorecard Basic Test Suite passes"
            }
        }
    }

    fn check_url(&self) -> &'static str {
        match self {
            ScorecardSuite::Olm => {
                "https://sdk.operatorframework.io/docs/testing-operators/scorecard/#olm-test-suite"
            }
            ScorecardSuite::Basic => {
                "https://sdk.operatorframework.io/docs/testing-operators/scorecard/#basic-test-suite"
            }
        }
    }
}

/// Runs one scorecard suite and passes iff every scored result passed.
#[derive(Debug, Clone)]
pub struct ScorecardSuiteCheck {
    suite: ScorecardSuite,
    consumer: ScorecardConsumer,
    config: ScorecardConfig,
}

impl ScorecardSuiteCheck {
    pub fn new(
        suite: ScorecardSuite,
        runner: Arc<dyn ScorecardRunner>,
        config: ScorecardConfig,
    ) -> Self {
        Self {
            suite,
            consumer: ScorecardConsumer::new(runner),
            config,
        }
    }

    fn verdict_for(&self, report: &ScorecardReport) -> Verdict {
        let failed = report.failed_results();
        if failed.is_empty() {
            return Verdict::pass();
        }

        let findings = failed
            .iter()
            .map(|result| {
                info!(
                    test = %result.name,
                    state = result.state.as_str(),
                    "scorecard test did not pass: {}",
                    result.log
                );
                let mut message =
                    format!("{} returned state {}", result.name, result.state.as_str());
                if !result.errors.is_empty() {
                    message.push_str(&format!(": {}", result.errors.join("; ")));
                }
                Finding::new(result.name.clone(), message)
            })
            .collect();

        Verdict::fail(format!(
            "{} of the scorecard results did not pass",
            failed.len()
        ))
        .with_findings(findings)
    }
}

#[async_trait]
impl Check for ScorecardSuiteCheck {
    fn name(&self) -> &'static str {
        self.suite.check_name()
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            description: self.suite.description().to_string(),
            level: Level::Best,
            knowledge_base_url: SCORECARD_OVERVIEW_URL.to_string(),
            check_url: self.suite.check_url().to_string(),
        }
    }

    async fn validate(&self, bundle: &BundleRef) -> Verdict {
        debug!(image = %bundle.image_uri, "running operator-sdk scorecard check");

        let request = self.config.request(
            bundle.fs_path.clone(),
            &[self.suite.selector()],
            self.suite.result_file(),
        );
        match self.consumer.run(&request).await {
            Ok(report) => self.verdict_for(&report),
            Err(e) => Verdict::error(e, true),
        }
    }

    fn help(&self, status: &VerdictStatus) -> HelpText {
        if status.is_fatal() {
            return HelpText::new(
                "There was a fatal error while running operator-sdk scorecard tests. Please see the log for details. If necessary, set logging to be more verbose.",
                "If the logs are showing a context timeout, try setting wait time to a higher value.",
            );
        }
        let result_file = self.suite.result_file();
        HelpText::new(
            format!(
                "Check {} encountered an error. Please review the {result_file} file in your execution artifacts for more information.",
                self.name()
            ),
            format!("See scorecard output for details, artifacts/{result_file}"),
        )
    }
}
