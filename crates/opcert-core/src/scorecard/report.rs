//! Scorecard report schema (`scorecard.operatorframework.io/v1alpha3` TestList).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// State of a single scorecard test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Pass,
    Fail,
    Error,
    #[serde(other)]
    Unknown,
}

impl TestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestState::Pass => "pass",
            TestState::Fail => "fail",
            TestState::Error => "error",
            TestState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(default)]
    pub name: String,
    pub state: TestState,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSpec {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub entrypoint: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStatus {
    #[serde(default)]
    pub results: Vec<TestResult>,
}

/// One scored item of the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardTest {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub spec: TestSpec,
    #[serde(default)]
    pub status: TestStatus,
}

/// Parsed scorecard output: an ordered list of scored items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardReport {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub items: Vec<ScorecardTest>,
}

impl ScorecardReport {
    pub fn from_json(raw: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(raw)
    }

    /// Results whose state is anything other than `pass`, in report order.
    pub fn failed_results(&self) -> Vec<&TestResult> {
        self.items
            .iter()
            .flat_map(|item| item.status.results.iter())
            .filter(|result| result.state != TestState::Pass)
            .collect()
    }

    /// The report passes iff every result of every item passed.
    pub fn passed(&self) -> bool {
        self.failed_results().is_empty()
    }
}
