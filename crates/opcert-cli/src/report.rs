//! Human and JSON rendering of check results.

use std::fmt::Write as _;
use std::path::Path;

use opcert_core::{Check, CheckResult, Metadata, Results};
use serde::Serialize;

/// JSON document printed by `opcert check --json`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub image: &'a str,
    pub bundle_path: &'a Path,
    pub passed: bool,
    pub results: &'a Results,
}

/// One entry of `opcert list --json`.
#[derive(Debug, Serialize)]
pub struct CheckListing {
    pub name: &'static str,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl CheckListing {
    pub fn from_check(check: &dyn Check) -> Self {
        Self {
            name: check.name(),
            metadata: check.metadata(),
        }
    }
}

fn render_result(out: &mut String, marker: &str, result: &CheckResult, show_help: bool) {
    let _ = writeln!(
        out,
        "  {marker} {} [{}] ({}ms)",
        result.name, result.metadata.level, result.elapsed_ms
    );
    if let Some(reason) = &result.reason {
        let _ = writeln!(out, "      {reason}");
    }
    for finding in &result.findings {
        let _ = writeln!(out, "      - {}", finding.message);
    }
    if show_help {
        let _ = writeln!(out, "      Message: {}", result.help.message);
        let _ = writeln!(out, "      Suggestion: {}", result.help.suggestion);
    }
}

/// Plain-text summary of one run.
pub fn render_text(image: &str, bundle_path: &Path, results: &Results) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Bundle: {image} ({})", bundle_path.display());
    let _ = writeln!(out);

    for result in &results.passed {
        render_result(&mut out, "✓", result, false);
    }
    for result in &results.not_applicable {
        render_result(&mut out, "-", result, false);
    }
    for result in &results.failed {
        render_result(&mut out, "✗", result, true);
    }
    for result in &results.errors {
        render_result(&mut out, "!", result, true);
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Summary: {} passed, {} failed, {} not applicable, {} errored",
        results.passed.len(),
        results.failed.len(),
        results.not_applicable.len(),
        results.errors.len()
    );
    out
}

pub fn render_listing(checks: &[Box<dyn Check>]) -> String {
    let mut out = String::new();
    for check in checks {
        let metadata = check.metadata();
        let _ = writeln!(
            out,
            "{} [{}]\n    {}",
            check.name(),
            metadata.level,
            metadata.description
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opcert_core::{RelatedImagesCheck, RestrictedNetworkCheck, Verdict};

    fn results() -> Results {
        let mut results = Results::default();
        results.record(&RelatedImagesCheck, Verdict::pass(), Utc::now(), 3);
        results.record(
            &RestrictedNetworkCheck,
            Verdict::fail("a related image is not pinned"),
            Utc::now(),
            5,
        );
        results
    }

    #[test]
    fn test_render_text_shows_help_for_failures_only() {
        let text = render_text("quay.io/acme/bundle:v1", Path::new("/bundle"), &results());

        assert!(text.contains("✓ AllImageRefsInRelatedImages [optional] (3ms)"));
        assert!(text.contains("✗ FollowsRestrictedNetworkEnablementGuidelines"));
        assert!(text.contains("a related image is not pinned"));
        assert_eq!(text.matches("Suggestion:").count(), 1);
        assert!(text.contains("Summary: 1 passed, 1 failed, 0 not applicable, 0 errored"));
    }

    #[test]
    fn test_run_report_json_shape() {
        let results = results();
        let report = RunReport {
            image: "quay.io/acme/bundle:v1",
            bundle_path: Path::new("/bundle"),
            passed: results.all_passed(),
            results: &results,
        };
        let value = serde_json::to_value(&report).expect("encode");
        assert_eq!(value["passed"], false);
        assert_eq!(value["results"]["failed"][0]["status"], "failed");
        assert_eq!(value["results"]["passed"][0]["metadata"]["level"], "optional");
    }

    #[test]
    fn test_listing_flattens_metadata() {
        let listing = CheckListing::from_check(&RestrictedNetworkCheck);
        let value = serde_json::to_value(&listing).expect("encode");
        assert_eq!(value["name"], "FollowsRestrictedNetworkEnablementGuidelines");
        assert_eq!(value["level"], "optional");
        assert!(value["check_url"].is_string());
    }
}
