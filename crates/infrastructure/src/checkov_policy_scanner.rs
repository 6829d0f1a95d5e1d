//! Checkov subprocess adapter for the policy scanner port.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use driftscan_application::PolicyScanner;
use driftscan_core::{AppError, AppResult};
use driftscan_domain::PolicyCheckResult;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CheckovOutput {
    Reports(Vec<CheckovReport>),
    Report(CheckovReport),
}

#[derive(Debug, Deserialize)]
struct CheckovReport {
    #[serde(default)]
    check_type: Option<String>,
    #[serde(default)]
    results: Option<CheckovResults>,
}

#[derive(Debug, Deserialize)]
struct CheckovResults {
    #[serde(default)]
    failed_checks: Vec<CheckovFailedCheck>,
}

#[derive(Debug, Deserialize)]
struct CheckovFailedCheck {
    check_id: String,
    check_name: String,
    resource: String,
}

/// Runs `checkov -f <template> --output json` and collects failed checks.
#[derive(Debug, Clone)]
pub struct CheckovPolicyScanner {
    binary: String,
}

impl CheckovPolicyScanner {
    /// Creates a scanner invoking the given checkov executable.
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl PolicyScanner for CheckovPolicyScanner {
    async fn scan_template(&self, template_path: &Path) -> AppResult<Vec<PolicyCheckResult>> {
        let output = Command::new(self.binary.as_str())
            .arg("-f")
            .arg(template_path)
            .arg("--output")
            .arg("json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|error| {
                AppError::Scanner(format!("failed to run '{}': {error}", self.binary))
            })?;

        // checkov exits non-zero whenever a check fails; only the output matters.
        info!(
            scanner = %self.binary,
            template = %template_path.display(),
            exit_code = output.status.code(),
            "policy scan finished"
        );

        parse_checkov_output(&output.stdout)
    }
}

/// Parses checkov JSON output into failed checks.
///
/// Accepts a single report object or an array of reports. A report without
/// `results` (checkov's summary-only output) contributes no findings.
pub fn parse_checkov_output(stdout: &[u8]) -> AppResult<Vec<PolicyCheckResult>> {
    let output = serde_json::from_slice::<CheckovOutput>(stdout).map_err(|error| {
        AppError::Scanner(format!("failed to parse checkov output as JSON: {error}"))
    })?;

    let reports = match output {
        CheckovOutput::Reports(reports) => reports,
        CheckovOutput::Report(report) => vec![report],
    };

    let mut findings = Vec::new();
    for report in reports {
        let Some(results) = report.results else {
            warn!(
                check_type = report.check_type.as_deref().unwrap_or("unknown"),
                "checkov report carries no results"
            );
            continue;
        };

        findings.extend(
            results
                .failed_checks
                .into_iter()
                .map(|check| PolicyCheckResult {
                    check_id: check.check_id,
                    check_name: check.check_name,
                    resource: check.resource,
                }),
        );
    }

    Ok(findings)
}
