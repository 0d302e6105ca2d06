use atomkit_core::{Notification, RunResult};
use atomkit_saga::RunAuditLog;
use serde::Serialize;

use crate::error::{CliError, Result};

#[derive(Serialize)]
struct JsonReport<'a> {
    notification: Notification,
    #[serde(flatten)]
    result: &'a RunResult,
}

pub(crate) fn render_json(result: &RunResult) -> Result<String> {
    let report = JsonReport {
        notification: result.notification(),
        result,
    };
    serde_json::to_string_pretty(&report).map_err(CliError::Output)
}

/// The notification line followed by one audit line per attempted operation.
pub(crate) fn render_plain(result: &RunResult, audit_log: &RunAuditLog) -> String {
    let mut output = result.notification().message;

    if !audit_log.records().is_empty() {
        output.push_str("\n\n");
        output.push_str(&audit_log.summary());
    }

    output
}
