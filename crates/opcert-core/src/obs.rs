//! Structured observability hooks for check evaluation.
//!
//! This module provides:
//! - A check-scoped tracing span carrying `check` and `image` fields
//! - Emission functions for check lifecycle events: start, finding, finish, error
//!
//! Nothing here installs a subscriber. With no subscriber in scope every call
//! is a no-op, so checks can run under whatever dispatcher the caller provides.

use tracing::{info, warn};

/// Span scoping every event of one check evaluation.
///
/// Attach it with `tracing::Instrument::instrument` so the fields follow the
/// evaluation across await points.
pub fn check_span(check: &str, image: &str) -> tracing::Span {
    tracing::info_span!("opcert.check", check = %check, image = %image)
}

/// Emit event: check evaluation started.
pub fn emit_check_started(check: &str, bundle_path: &std::path::Path) {
    info!(event = "check.started", check = %check, bundle = %bundle_path.display());
}

/// Emit event: an informational finding that does not affect the verdict.
pub fn emit_finding(check: &str, subject: &str, message: &str) {
    info!(event = "check.finding", check = %check, subject = %subject, "{}", message);
}

/// Emit event: check finished with a status label.
pub fn emit_check_finished(check: &str, status: &str, duration_ms: u64) {
    info!(
        event = "check.finished",
        check = %check,
        status = %status,
        duration_ms = duration_ms,
    );
}

/// Emit event: check could not be evaluated (warning level).
pub fn emit_check_errored(check: &str, error: &dyn std::fmt::Display, fatal: bool) {
    warn!(event = "check.errored", check = %check, fatal = fatal, error = %error);
}
