//! opcert core: policy checks for unpacked operator bundles
//!
//! Given the filesystem path of an extracted operator bundle image, the checks
//! in this crate decide whether the bundle satisfies a certification policy:
//! - `AllImageRefsInRelatedImages`: container images are declared as related images (informational)
//! - `FollowsRestrictedNetworkEnablementGuidelines`: disconnected-ready CSV conventions
//! - `ScorecardOlmSuiteCheck` / `ScorecardBasicSpecCheck`: operator-sdk scorecard suites
//!
//! Image extraction and the host that sequences checks and reports results
//! live outside this crate; [`engine::CheckEngine`] fixes the host contract.

pub mod bundle;
pub mod check;
pub mod csv;
pub mod engine;
mod error;
pub mod fakes;
pub mod image_ref;
pub mod obs;
pub mod scorecard;
pub mod telemetry;

pub use bundle::{extract_facts, load_csv, BundleFacts, BundleRef};
pub use check::{
    default_checks, run_check, Check, Finding, HelpText, Level, Metadata, RelatedImagesCheck,
    RestrictedNetworkCheck, ScorecardSuite, ScorecardSuiteCheck, Verdict, VerdictStatus,
};
pub use csv::ClusterServiceVersion;
pub use engine::{CheckEngine, CheckResult, Results};
pub use error::{CheckError, Result, ScorecardError};
pub use image_ref::{all_pinned, ImageReference, RelatedImage};
pub use obs::{emit_check_errored, emit_check_finished, emit_check_started, emit_finding};
pub use scorecard::{OperatorSdkCli, ScorecardConfig, ScorecardReport, ScorecardRunner};
pub use telemetry::init_tracing;
