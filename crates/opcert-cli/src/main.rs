//! opcert - operator bundle certification checks
//!
//! ## Commands
//!
//! - `check`: run every check against an unpacked bundle directory
//! - `list`: describe the available checks

mod engine;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use opcert_core::scorecard::{DEFAULT_ARTIFACTS_DIR, DEFAULT_WAIT_TIME_SECS};
use opcert_core::{
    default_checks, BundleRef, Check, CheckEngine, OperatorSdkCli, ScorecardConfig,
    ScorecardRunner, ScorecardSuite,
};
use tracing::{info, Level};

use crate::engine::SequentialEngine;
use crate::report::{render_listing, render_text, CheckListing, RunReport};

#[derive(Parser)]
#[command(name = "opcert")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Certification policy checks for operator bundles", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "OPCERT_VERBOSE")]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "OPCERT_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks against an unpacked bundle
    Check(CheckArgs),

    /// List the available checks
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Path to the unpacked bundle (the directory containing `manifests/`)
    #[arg(env = "OPCERT_BUNDLE_PATH")]
    bundle_path: PathBuf,

    /// Image reference the bundle was extracted from (default: the bundle path)
    #[arg(long, env = "OPCERT_IMAGE")]
    image: Option<String>,

    /// Directory for scorecard reports
    #[arg(long, env = "OPCERT_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    artifacts_dir: PathBuf,

    /// Namespace scorecard tests run in
    #[arg(long, env = "OPCERT_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Service account scorecard tests run as
    #[arg(long, env = "OPCERT_SERVICE_ACCOUNT", default_value = "default")]
    service_account: String,

    /// Kubeconfig for the cluster scorecard tests run against
    #[arg(long, env = "OPCERT_KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Seconds to wait for a scorecard suite to finish
    #[arg(long, env = "OPCERT_SCORECARD_WAIT_TIME", default_value_t = DEFAULT_WAIT_TIME_SECS)]
    scorecard_wait_time: u64,

    /// operator-sdk binary to invoke
    #[arg(long, env = "OPCERT_OPERATOR_SDK", default_value = "operator-sdk")]
    operator_sdk: String,

    /// Skip the scorecard suites (no cluster required)
    #[arg(long, env = "OPCERT_SKIP_SCORECARD")]
    skip_scorecard: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

impl CheckArgs {
    fn scorecard_config(&self) -> ScorecardConfig {
        ScorecardConfig {
            namespace: self.namespace.clone(),
            service_account: self.service_account.clone(),
            kubeconfig: self.kubeconfig.clone(),
            wait_time_secs: self.scorecard_wait_time,
            artifacts_dir: self.artifacts_dir.clone(),
        }
    }
}

/// The checks a run evaluates, in order.
fn select_checks(
    runner: Arc<dyn ScorecardRunner>,
    config: ScorecardConfig,
    skip_scorecard: bool,
) -> Vec<Box<dyn Check>> {
    let mut checks = default_checks(runner, config);
    if skip_scorecard {
        checks.retain(|check| !ScorecardSuite::is_suite_check(check.name()));
    }
    checks
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    opcert_core::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Check(args) => cmd_check(args).await,
        Commands::List { json } => cmd_list(json),
    }
}

async fn cmd_check(args: CheckArgs) -> Result<()> {
    let bundle_path = args
        .bundle_path
        .canonicalize()
        .with_context(|| format!("Bundle path not found: {:?}", args.bundle_path))?;
    let image = args
        .image
        .clone()
        .unwrap_or_else(|| bundle_path.display().to_string());

    let runner: Arc<dyn ScorecardRunner> = Arc::new(OperatorSdkCli::new(&args.operator_sdk));
    let checks = select_checks(runner, args.scorecard_config(), args.skip_scorecard);
    info!(
        image = %image,
        skip_scorecard = args.skip_scorecard,
        "starting bundle checks"
    );

    let mut engine = SequentialEngine::new(BundleRef::new(image.clone(), &bundle_path), checks);
    engine
        .execute_checks()
        .await
        .context("Failed to execute checks")?;
    let results = engine.results();

    if args.json {
        let report = RunReport {
            image: &image,
            bundle_path: &bundle_path,
            passed: results.all_passed(),
            results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&image, &bundle_path, results));
    }

    if results.all_passed() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {} checks did not pass",
            results.failed.len() + results.errors.len(),
            results.total()
        )
    }
}

fn cmd_list(json: bool) -> Result<()> {
    let checks = default_checks(
        Arc::new(OperatorSdkCli::default()),
        ScorecardConfig::default(),
    );

    if json {
        let listing: Vec<CheckListing> = checks
            .iter()
            .map(|check| CheckListing::from_check(check.as_ref()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print!("{}", render_listing(&checks));
    }
    Ok(())
}
