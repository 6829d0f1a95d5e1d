use std::path::Path;

use async_trait::async_trait;
use driftscan_core::AppResult;
use driftscan_domain::PolicyCheckResult;

/// Port for the static-analysis policy scanner.
#[async_trait]
pub trait PolicyScanner: Send + Sync {
    /// Scans a template and returns every failing check.
    async fn scan_template(&self, template_path: &Path) -> AppResult<Vec<PolicyCheckResult>>;
}
