//! operator-sdk scorecard integration.
//!
//! The tool itself is an external collaborator: [`ScorecardRunner`] invokes it
//! and leaves a JSON report behind, [`ScorecardConsumer`] bounds the run by a
//! wait budget and parses the report.

pub mod consumer;
pub mod report;
pub mod runner;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use consumer::ScorecardConsumer;
pub use report::{ScorecardReport, ScorecardTest, TestResult, TestState};
pub use runner::{OperatorSdkCli, ScorecardRequest, ScorecardRunner};

/// Default wait budget for a scorecard run.
pub const DEFAULT_WAIT_TIME_SECS: u64 = 240;

/// Default directory for scorecard reports.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Cluster context and limits for scorecard runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorecardConfig {
    pub namespace: String,
    pub service_account: String,
    pub kubeconfig: Option<PathBuf>,
    pub wait_time_secs: u64,
    pub artifacts_dir: PathBuf,
}

impl Default for ScorecardConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            service_account: "default".to_string(),
            kubeconfig: None,
            wait_time_secs: DEFAULT_WAIT_TIME_SECS,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
        }
    }
}

impl ScorecardConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }

    /// Build a request for one suite run against `bundle_path`.
    pub fn request(
        &self,
        bundle_path: impl Into<PathBuf>,
        selector: &[&str],
        result_file: &str,
    ) -> ScorecardRequest {
        ScorecardRequest {
            bundle_path: bundle_path.into(),
            selector: selector.iter().map(|s| s.to_string()).collect(),
            result_file: result_file.to_string(),
            artifacts_dir: self.artifacts_dir.clone(),
            namespace: self.namespace.clone(),
            service_account: self.service_account.clone(),
            kubeconfig: self.kubeconfig.clone(),
            wait_time: self.wait_time(),
        }
    }
}
