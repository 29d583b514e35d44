//! Sequential check engine.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use opcert_core::{run_check, BundleRef, Check, CheckEngine, Results};
use tracing::info;

/// Runs every registered check against one bundle, one after another.
pub struct SequentialEngine {
    bundle: BundleRef,
    checks: Vec<Box<dyn Check>>,
    results: Results,
}

impl SequentialEngine {
    pub fn new(bundle: BundleRef, checks: Vec<Box<dyn Check>>) -> Self {
        Self {
            bundle,
            checks,
            results: Results::default(),
        }
    }

    pub fn bundle(&self) -> &BundleRef {
        &self.bundle
    }
}

#[async_trait]
impl CheckEngine for SequentialEngine {
    async fn execute_checks(&mut self) -> opcert_core::Result<()> {
        info!(
            image = %self.bundle.image_uri,
            checks = self.checks.len(),
            "executing checks"
        );

        for check in &self.checks {
            let started_at = Utc::now();
            let start = Instant::now();
            let verdict = run_check(check.as_ref(), &self.bundle).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            self.results
                .record(check.as_ref(), verdict, started_at, elapsed_ms);
        }

        info!(
            passed = self.results.passed.len(),
            failed = self.results.failed.len(),
            not_applicable = self.results.not_applicable.len(),
            errors = self.results.errors.len(),
            "checks finished"
        );
        Ok(())
    }

    fn results(&self) -> &Results {
        &self.results
    }
}
