//! End-to-end drift analysis pipeline.
//!
//! Runs strictly forward: probe the enrichment service, build and wait for a
//! change set, collect modified resources, attach scanner findings, build and
//! enrich alerts, then publish the rendered report on the pull request.

use std::path::Path;
use std::sync::Arc;

use driftscan_core::{AppError, AppResult};
use driftscan_domain::{
    Alert, AlertContext, ChangeSetDescription, DecoratedAlert, ModifiedResources,
    PullRequestRef, RiskAttribution, build_alerts, build_report_rows,
};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::report_renderer::{compose_comment_body, render_report_table};
use crate::{
    AccountIdentity, AlertEnricher, ChangeSetProvider, ChangeSetRequest, ChangeSetWaiter,
    CommentPublisher, PolicyScanner, TemplateUpload, WaitPolicy,
};

#[cfg(test)]
mod tests;

/// External collaborators of a drift analysis run.
#[derive(Clone)]
pub struct DriftAnalysisPorts {
    /// Object storage and change-set engine.
    pub change_sets: Arc<dyn ChangeSetProvider>,
    /// Caller identity lookup.
    pub identity: Arc<dyn AccountIdentity>,
    /// Static-analysis scanner.
    pub scanner: Arc<dyn PolicyScanner>,
    /// Risk-scoring service.
    pub enricher: Arc<dyn AlertEnricher>,
    /// Pull request comment sink.
    pub publisher: Arc<dyn CommentPublisher>,
}

/// Per-run inputs of the pipeline.
#[derive(Debug, Clone)]
pub struct DriftAnalysisSettings {
    /// Stack to preview an update for.
    pub stack_name: String,
    /// Bucket receiving the template.
    pub bucket: String,
    /// Template file; used as the local path and the object key.
    pub template_file: String,
    /// Region reported on every alert.
    pub region: String,
    /// Pull request receiving the report.
    pub pull_request: PullRequestRef,
    /// Change set wait cadence.
    pub wait_policy: WaitPolicy,
    /// Risk column assignment in the report.
    pub risk_attribution: RiskAttribution,
}

/// Result of the publish step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The report was posted.
    Posted,
    /// Nothing to report, no comment was posted.
    Skipped,
    /// Posting failed; the run still counts as successful.
    Failed(String),
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Name of the change set created for the run.
    pub change_set_name: String,
    /// Distinct resources the change set would modify.
    pub modified_resources: usize,
    /// Scanner findings attached to modified resources.
    pub findings_attached: usize,
    /// Alerts sent for enrichment.
    pub alerts: usize,
    /// Rendered report table, when one was produced.
    pub report: Option<String>,
    /// Publish step result.
    pub publish: PublishOutcome,
}

/// Application service running one drift analysis.
#[derive(Clone)]
pub struct DriftAnalysisService {
    ports: DriftAnalysisPorts,
    waiter: ChangeSetWaiter,
    settings: DriftAnalysisSettings,
}

impl DriftAnalysisService {
    /// Creates a new drift analysis service.
    #[must_use]
    pub fn new(ports: DriftAnalysisPorts, settings: DriftAnalysisSettings) -> Self {
        let waiter = ChangeSetWaiter::new(ports.change_sets.clone(), settings.wait_policy);
        Self {
            ports,
            waiter,
            settings,
        }
    }

    /// Runs the pipeline once.
    ///
    /// Every failure aborts the run except publishing, which is reported in
    /// the summary instead.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) -> AppResult<RunSummary> {
        self.ports.enricher.check_availability().await?;
        info!("enrichment service is reachable");

        let change_set = self.prepare_change_set(&mut cancel).await?;
        let mut resources = ModifiedResources::from_change_set(&change_set);
        info!(
            change_set = %change_set.change_set_name,
            total_changes = change_set.changes.len(),
            modified_resources = resources.len(),
            "collected modified resources"
        );

        let mut summary = RunSummary {
            change_set_name: change_set.change_set_name.clone(),
            modified_resources: resources.len(),
            findings_attached: 0,
            alerts: 0,
            report: None,
            publish: PublishOutcome::Skipped,
        };

        if resources.is_empty() {
            info!("change set modifies no existing resources, nothing to report");
            return Ok(summary);
        }

        let findings = self
            .ports
            .scanner
            .scan_template(Path::new(self.settings.template_file.as_str()))
            .await?;
        summary.findings_attached = resources.attach_findings(&findings);
        info!(
            findings = findings.len(),
            attached = summary.findings_attached,
            "attached scanner findings to modified resources"
        );

        let context = AlertContext {
            account: self.ports.identity.account_id().await?,
            region: self.settings.region.clone(),
        };
        let alerts = build_alerts(&resources, &context);
        summary.alerts = alerts.len();
        log_alerts(&alerts)?;

        if alerts.is_empty() {
            info!("no modified resource violates a policy, nothing to report");
            return Ok(summary);
        }

        let decorated_alerts = self.enrich_alerts(&alerts, &cancel).await?;
        let rows = build_report_rows(&decorated_alerts, self.settings.risk_attribution);
        let table = render_report_table(&rows);
        info!(
            rows = rows.len(),
            risk_attribution = self.settings.risk_attribution.as_str(),
            report = %table,
            "rendered change analysis report"
        );

        summary.publish = self.publish(&table).await;
        summary.report = Some(table);

        Ok(summary)
    }

    async fn prepare_change_set(
        &self,
        cancel: &mut watch::Receiver<bool>,
    ) -> AppResult<ChangeSetDescription> {
        ensure_not_cancelled(cancel)?;

        let template_url = self
            .ports
            .change_sets
            .upload_template(&TemplateUpload {
                bucket: self.settings.bucket.clone(),
                key: self.settings.template_file.clone(),
                local_path: self.settings.template_file.clone().into(),
            })
            .await?;
        info!(template_url = %template_url, "uploaded template");

        let handle = self
            .ports
            .change_sets
            .create_change_set(&ChangeSetRequest {
                stack_name: self.settings.stack_name.clone(),
                change_set_name: new_change_set_name(),
                template_url,
            })
            .await?;
        info!(
            stack = %handle.stack_name,
            change_set = %handle.change_set_name,
            "requested change set"
        );

        self.waiter.wait_until_complete(&handle, cancel).await?;

        self.ports.change_sets.describe_change_set(&handle).await
    }

    async fn enrich_alerts(
        &self,
        alerts: &[Alert],
        cancel: &watch::Receiver<bool>,
    ) -> AppResult<Vec<DecoratedAlert>> {
        let mut decorated_alerts = Vec::with_capacity(alerts.len());

        for (position, alert) in alerts.iter().enumerate() {
            ensure_not_cancelled(cancel)?;
            let decorated = self.ports.enricher.enrich(alert).await?;
            info!(
                alert = position + 1,
                total = alerts.len(),
                resource = %alert.logical_resource_id,
                check_id = %alert.check_id,
                "enriched alert"
            );
            decorated_alerts.push(decorated);
        }

        Ok(decorated_alerts)
    }

    async fn publish(&self, table: &str) -> PublishOutcome {
        let body = compose_comment_body(table);
        let pull_request = &self.settings.pull_request;

        match self.ports.publisher.publish_comment(pull_request, &body).await {
            Ok(()) => {
                info!(
                    repository = pull_request.repository(),
                    pull_request = pull_request.number(),
                    "posted change analysis comment"
                );
                PublishOutcome::Posted
            }
            Err(error) => {
                warn!(
                    repository = pull_request.repository(),
                    pull_request = pull_request.number(),
                    error = %error,
                    "failed to post change analysis comment"
                );
                PublishOutcome::Failed(error.to_string())
            }
        }
    }
}

fn new_change_set_name() -> String {
    format!("cft-{}", Uuid::new_v4().simple())
}

fn ensure_not_cancelled(cancel: &watch::Receiver<bool>) -> AppResult<()> {
    if *cancel.borrow() {
        return Err(AppError::Cancelled("drift analysis run was cancelled".to_owned()));
    }

    Ok(())
}

fn log_alerts(alerts: &[Alert]) -> AppResult<()> {
    for alert in alerts {
        let payload = serde_json::to_string(alert)
            .map_err(|error| AppError::Internal(format!("failed to serialize alert: {error}")))?;
        info!(alert = %payload, "built alert");
    }

    Ok(())
}
