//! Scorecard tool invocation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ScorecardError;

/// Gap between the tool's own `--wait-time` and the consumer's outer budget.
pub const TOOL_WAIT_MARGIN: Duration = Duration::from_secs(10);

/// Everything needed to run one scorecard suite against a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorecardRequest {
    /// Path of the unpacked bundle.
    pub bundle_path: PathBuf,
    /// Label selectors restricting which tests run (e.g. `suite=olm`).
    pub selector: Vec<String>,
    /// File name of the report inside `artifacts_dir`.
    pub result_file: String,
    pub artifacts_dir: PathBuf,
    pub namespace: String,
    pub service_account: String,
    pub kubeconfig: Option<PathBuf>,
    /// Wait budget for the whole run.
    pub wait_time: Duration,
}

impl ScorecardRequest {
    pub fn result_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.result_file)
    }

    /// Wait handed to the tool: the budget less [`TOOL_WAIT_MARGIN`], never
    /// under one second.
    pub fn tool_wait_time(&self) -> Duration {
        self.wait_time
            .saturating_sub(TOOL_WAIT_MARGIN)
            .max(Duration::from_secs(1))
    }
}

/// Runs the external scoring tool.
///
/// Implementations must leave the JSON report at [`ScorecardRequest::result_path`]
/// when they return `Ok`. They are not responsible for enforcing the wait
/// budget; the consumer does that.
#[async_trait]
pub trait ScorecardRunner: Send + Sync {
    async fn run(&self, request: &ScorecardRequest) -> Result<(), ScorecardError>;
}

/// Runs `operator-sdk scorecard` as a subprocess.
#[derive(Debug, Clone)]
pub struct OperatorSdkCli {
    program: String,
}

impl Default for OperatorSdkCli {
    fn default() -> Self {
        Self::new("operator-sdk")
    }
}

impl OperatorSdkCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed after the program name.
    pub fn args(&self, request: &ScorecardRequest) -> Vec<String> {
        let mut args = vec![
            "scorecard".to_string(),
            request.bundle_path.to_string_lossy().to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        for selector in &request.selector {
            args.push("--selector".to_string());
            args.push(selector.clone());
        }
        if !request.namespace.is_empty() {
            args.push("--namespace".to_string());
            args.push(request.namespace.clone());
        }
        if !request.service_account.is_empty() {
            args.push("--service-account".to_string());
            args.push(request.service_account.clone());
        }
        if let Some(kubeconfig) = &request.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig.to_string_lossy().to_string());
        }
        args.push("--wait-time".to_string());
        args.push(format!("{}s", request.tool_wait_time().as_secs()));
        args
    }
}

#[async_trait]
impl ScorecardRunner for OperatorSdkCli {
    async fn run(&self, request: &ScorecardRequest) -> Result<(), ScorecardError> {
        let start = Instant::now();
        let args = self.args(request);
        debug!(program = %self.program, args = ?args, "spawning scorecard");

        let child = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScorecardError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = child.wait_with_output().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        // scorecard exits non-zero when a test fails but still prints the report
        if !output.status.success() && output.stdout.is_empty() {
            return Err(ScorecardError::ToolFailed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tokio::fs::write(request.result_path(), &output.stdout).await?;
        info!(
            result = %request.result_path().display(),
            duration_ms = duration_ms,
            "scorecard report written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dir: &std::path::Path) -> ScorecardRequest {
        ScorecardRequest {
            bundle_path: PathBuf::from("/bundle"),
            selector: vec!["suite=olm".to_string()],
            result_file: "report.json".to_string(),
            artifacts_dir: dir.to_path_buf(),
            namespace: "certify".to_string(),
            service_account: "default".to_string(),
            kubeconfig: Some(PathBuf::from("/tmp/kubeconfig")),
            wait_time: Duration::from_secs(240),
        }
    }

    #[test]
    fn test_operator_sdk_args() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = OperatorSdkCli::default().args(&request(dir.path()));
        assert_eq!(args[0], "scorecard");
        assert_eq!(args[1], "/bundle");
        let joined = args.join(" ");
        assert!(joined.contains("--output json"));
        assert!(joined.contains("--selector suite=olm"));
        assert!(joined.contains("--namespace certify"));
        assert!(joined.contains("--service-account default"));
        assert!(joined.contains("--kubeconfig /tmp/kubeconfig"));
        assert!(joined.ends_with("--wait-time 230s"));
    }

    #[test]
    fn test_tool_wait_is_below_outer_budget() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut req = request(dir.path());
        assert_eq!(req.tool_wait_time(), Duration::from_secs(230));
        assert!(req.tool_wait_time() < req.wait_time);

        req.wait_time = Duration::from_secs(5);
        assert_eq!(req.tool_wait_time(), Duration::from_secs(1));
        let joined = OperatorSdkCli::default().args(&req).join(" ");
        assert!(joined.ends_with("--wait-time 1s"));
    }

    #[test]
    fn test_empty_credentials_are_omitted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut req = request(dir.path());
        req.namespace.clear();
        req.service_account.clear();
        req.kubeconfig = None;
        let joined = OperatorSdkCli::default().args(&req).join(" ");
        assert!(!joined.contains("--namespace"));
        assert!(!joined.contains("--service-account"));
        assert!(!joined.contains("--kubeconfig"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = OperatorSdkCli::new("opcert-definitely-not-installed");
        let err = runner.run(&request(dir.path())).await.unwrap_err();
        assert!(matches!(err, ScorecardError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_stdout_becomes_result_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = OperatorSdkCli::new("echo");
        runner.run(&request(dir.path())).await.expect("run");
        let written = std::fs::read_to_string(dir.path().join("report.json")).expect("read");
        assert!(written.starts_with("scorecard /bundle"));
    }

    #[tokio::test]
    async fn test_failing_program_without_output_is_tool_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = OperatorSdkCli::new("false");
        let err = runner.run(&request(dir.path())).await.unwrap_err();
        assert!(matches!(err, ScorecardError::ToolFailed { .. }));
    }
}
