//! Bounded scorecard runs and report consumption.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ScorecardError;
use crate::scorecard::report::ScorecardReport;
use crate::scorecard::runner::{ScorecardRequest, ScorecardRunner};

/// Triggers a scorecard run within its wait budget and parses the report it leaves behind.
#[derive(Clone)]
pub struct ScorecardConsumer {
    runner: Arc<dyn ScorecardRunner>,
}

impl ScorecardConsumer {
    pub fn new(runner: Arc<dyn ScorecardRunner>) -> Self {
        Self { runner }
    }

    /// Run once and read the result file once. Failures are returned as-is and never retried.
    pub async fn run(&self, request: &ScorecardRequest) -> Result<ScorecardReport, ScorecardError> {
        tokio::fs::create_dir_all(&request.artifacts_dir).await?;

        match tokio::time::timeout(request.wait_time, self.runner.run(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    wait_secs = request.wait_time.as_secs(),
                    "scorecard run exceeded its wait budget"
                );
                return Err(ScorecardError::Timeout {
                    wait_secs: request.wait_time.as_secs(),
                });
            }
        }

        let path = request.result_path();
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| ScorecardError::MissingReport {
                path: path.clone(),
                source,
            })?;
        let report = ScorecardReport::from_json(&raw)
            .map_err(|source| ScorecardError::MalformedReport { path, source })?;

        debug!(items = report.items.len(), "decoded scorecard report");
        Ok(report)
    }
}

impl std::fmt::Debug for ScorecardConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorecardConsumer").finish_non_exhaustive()
    }
}
