//! JSON output helpers for `--json`.

use anyhow::{Context, Result};
use serde_json::json;

use crate::application::services::harness::RunReport;
use crate::domain::IdentityError;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format an error raised before any resource was acquired.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_startup_error(err: &anyhow::Error) -> Result<String> {
    let code = err
        .downcast_ref::<IdentityError>()
        .map_or("STARTUP_FAILED", IdentityError::code);
    format_error(&format!("{err:#}"), code)
}

/// Format a finished run: outcome, versions, phases and every teardown step.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_report(report: &RunReport) -> Result<String> {
    let (passed, error) = match &report.outcome {
        Ok(()) => (true, serde_json::Value::Null),
        Err(e) => (
            false,
            json!({ "code": e.code(), "message": e.to_string() }),
        ),
    };
    let obj = json!({
        "run_id": report.run_id,
        "passed": passed,
        "error": error,
        "started_at": report.started_at,
        "finished_at": report.finished_at,
        "versions": report.versions.as_ref().map(|v| json!({
            "engine": v.engine,
            "platform": v.platform,
        })),
        "phases": report.phases,
        "teardown": report.teardown,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
