//! Error taxonomy for bundle checks.

use std::path::PathBuf;

/// Errors produced while invoking the scorecard tool or consuming its report.
#[derive(Debug, thiserror::Error)]
pub enum ScorecardError {
    #[error("failed to spawn scorecard tool '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scorecard tool exited with code {exit_code}: {stderr}")]
    ToolFailed { exit_code: i32, stderr: String },

    #[error("scorecard run did not complete within {wait_secs}s")]
    Timeout { wait_secs: u64 },

    #[error("scorecard report not found at {path}: {source}")]
    MissingReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed scorecard report at {path}: {source}")]
    MalformedReport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScorecardError {
    /// Whether this error came from the wait budget running out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScorecardError::Timeout { .. })
    }
}

/// Errors that prevent a check from being evaluated at all.
///
/// These are distinct from a failing verdict: an error means the bundle could
/// not be inspected, not that it violates a policy.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("manifest discovery failed at {path}: {reason}")]
    ManifestDiscovery { path: PathBuf, reason: String },

    #[error("malformed CSV detected in {path}: {reason}")]
    MalformedCsv { path: PathBuf, reason: String },

    #[error("no ClusterServiceVersion found under {0}")]
    CsvNotFound(PathBuf),

    #[error("expected exactly one ClusterServiceVersion, found {count}")]
    MultipleCsvs { count: usize },

    #[error("scorecard error: {0}")]
    Scorecard(#[from] ScorecardError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for check operations.
pub type Result<T> = std::result::Result<T, CheckError>;
