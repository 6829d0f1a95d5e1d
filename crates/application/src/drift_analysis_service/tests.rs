use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use driftscan_core::{AppError, AppResult};
use driftscan_domain::{
    Alert, Change, ChangeAction, ChangeSetDescription, ChangeSetState, ChangeSetStatus,
    DecoratedAlert, PolicyCheckResult, PullRequestRef, ResourceChange, RiskAttribution,
};
use tokio::sync::watch;

use super::{DriftAnalysisPorts, DriftAnalysisService, DriftAnalysisSettings, PublishOutcome};
use crate::{
    AccountIdentity, AlertEnricher, ChangeSetHandle, ChangeSetProvider, ChangeSetRequest,
    CommentPublisher, PolicyScanner, TemplateUpload, WaitPolicy,
};

fn lock_error(error: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("failed to lock test state: {error}"))
}

#[derive(Default)]
struct TestChangeSets {
    changes: Vec<Change>,
    uploads: Mutex<Vec<TemplateUpload>>,
    requests: Mutex<Vec<ChangeSetRequest>>,
}

#[async_trait]
impl ChangeSetProvider for TestChangeSets {
    async fn upload_template(&self, upload: &TemplateUpload) -> AppResult<String> {
        self.uploads.lock().map_err(lock_error)?.push(upload.clone());
        Ok(format!(
            "https://{}.s3.amazonaws.com/{}",
            upload.bucket, upload.key
        ))
    }

    async fn create_change_set(&self, request: &ChangeSetRequest) -> AppResult<ChangeSetHandle> {
        self.requests.lock().map_err(lock_error)?.push(request.clone());
        Ok(ChangeSetHandle {
            stack_name: request.stack_name.clone(),
            change_set_name: request.change_set_name.clone(),
            change_set_id: None,
        })
    }

    async fn change_set_state(&self, _handle: &ChangeSetHandle) -> AppResult<ChangeSetState> {
        Ok(ChangeSetState {
            status: ChangeSetStatus::CreateComplete,
            status_reason: None,
        })
    }

    async fn describe_change_set(
        &self,
        handle: &ChangeSetHandle,
    ) -> AppResult<ChangeSetDescription> {
        Ok(ChangeSetDescription {
            change_set_name: handle.change_set_name.clone(),
            change_set_id: None,
            stack_name: handle.stack_name.clone(),
            status: ChangeSetStatus::CreateComplete,
            status_reason: None,
            creation_time: Some("2026-10-18T09:30:00Z".to_owned()),
            changes: self.changes.clone(),
        })
    }
}

struct TestIdentity;

#[async_trait]
impl AccountIdentity for TestIdentity {
    async fn account_id(&self) -> AppResult<String> {
        Ok("123456789012".to_owned())
    }
}

#[derive(Default)]
struct TestScanner {
    findings: Vec<PolicyCheckResult>,
    scanned: Mutex<Vec<String>>,
}

#[async_trait]
impl PolicyScanner for TestScanner {
    async fn scan_template(&self, template_path: &Path) -> AppResult<Vec<PolicyCheckResult>> {
        self.scanned
            .lock()
            .map_err(lock_error)?
            .push(template_path.display().to_string());
        Ok(self.findings.clone())
    }
}

#[derive(Default)]
struct TestEnricher {
    unavailable: bool,
    fail_on_check: Option<String>,
    enriched: Mutex<Vec<Alert>>,
}

#[async_trait]
impl AlertEnricher for TestEnricher {
    async fn check_availability(&self) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::ServiceUnavailable(
                "ping returned status 403".to_owned(),
            ));
        }

        Ok(())
    }

    async fn enrich(&self, alert: &Alert) -> AppResult<DecoratedAlert> {
        if self.fail_on_check.as_deref() == Some(alert.check_id.as_str()) {
            return Err(AppError::Enrichment(
                "enrichment endpoint returned status 500".to_owned(),
            ));
        }

        self.enriched.lock().map_err(lock_error)?.push(alert.clone());
        let risk_value = if alert.check_id == "CKV_AWS_18" { "HIGH" } else { "LOW" };

        serde_json::from_value(serde_json::json!({
            "dassana": {
                "normalize": {"output": {
                    "resourceId": alert.physical_resource_id,
                    "service": "s3",
                    "resourceType": "Bucket",
                    "vendorPolicy": alert.check_id
                }},
                "general-context": {"risk": {"riskValue": risk_value}},
                "resource-context": {},
                "policy-context": {}
            }
        }))
        .map_err(|error| AppError::Enrichment(format!("malformed fixture: {error}")))
    }
}

#[derive(Default)]
struct TestPublisher {
    fail: bool,
    comments: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CommentPublisher for TestPublisher {
    async fn publish_comment(&self, pull_request: &PullRequestRef, body: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Publish("hosting API returned status 502".to_owned()));
        }

        self.comments
            .lock()
            .map_err(lock_error)?
            .push((pull_request.comments_path(), body.to_owned()));
        Ok(())
    }
}

struct Harness {
    change_sets: Arc<TestChangeSets>,
    scanner: Arc<TestScanner>,
    enricher: Arc<TestEnricher>,
    publisher: Arc<TestPublisher>,
}

impl Harness {
    fn new(
        changes: Vec<Change>,
        findings: Vec<PolicyCheckResult>,
        enricher: TestEnricher,
        publisher: TestPublisher,
    ) -> Self {
        Self {
            change_sets: Arc::new(TestChangeSets {
                changes,
                ..TestChangeSets::default()
            }),
            scanner: Arc::new(TestScanner {
                findings,
                ..TestScanner::default()
            }),
            enricher: Arc::new(enricher),
            publisher: Arc::new(publisher),
        }
    }

    fn service(&self) -> DriftAnalysisService {
        let pull_request = PullRequestRef::new("acme/infra", 7)
            .unwrap_or_else(|error| panic!("pull request fixture should be valid: {error}"));

        DriftAnalysisService::new(
            DriftAnalysisPorts {
                change_sets: self.change_sets.clone(),
                identity: Arc::new(TestIdentity),
                scanner: self.scanner.clone(),
                enricher: self.enricher.clone(),
                publisher: self.publisher.clone(),
            },
            DriftAnalysisSettings {
                stack_name: "app-stack".to_owned(),
                bucket: "templates-bucket".to_owned(),
                template_file: "template.yaml".to_owned(),
                region: "us-east-1".to_owned(),
                pull_request,
                wait_policy: WaitPolicy {
                    poll_interval: Duration::from_millis(1),
                    max_polls: 3,
                },
                risk_attribution: RiskAttribution::PerAlert,
            },
        )
    }

    fn upload_count(&self) -> usize {
        self.change_sets.uploads.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    fn scan_count(&self) -> usize {
        self.scanner.scanned.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    fn enrich_count(&self) -> usize {
        self.enricher.enriched.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    fn comments(&self) -> Vec<(String, String)> {
        self.publisher
            .comments
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

fn change(action: ChangeAction, logical_id: &str) -> Change {
    Change::resource(ResourceChange {
        action,
        logical_resource_id: logical_id.to_owned(),
        physical_resource_id: Some(format!("{}-physical", logical_id.to_lowercase())),
        resource_type: "AWS::S3::Bucket".to_owned(),
        replacement: Some("False".to_owned()),
        scope: vec!["Properties".to_owned()],
        details: Vec::new(),
    })
}

fn finding(check_id: &str, logical_id: &str) -> PolicyCheckResult {
    PolicyCheckResult {
        check_id: check_id.to_owned(),
        check_name: format!("{check_id} check"),
        resource: format!("AWS::S3::Bucket.{logical_id}"),
    }
}

fn not_cancelled() -> watch::Receiver<bool> {
    let (_sender, receiver) = watch::channel(false);
    receiver
}

#[tokio::test]
async fn unavailable_enrichment_service_stops_before_change_set_creation() {
    let harness = Harness::new(
        vec![change(ChangeAction::Modify, "AppBucket")],
        Vec::new(),
        TestEnricher {
            unavailable: true,
            ..TestEnricher::default()
        },
        TestPublisher::default(),
    );

    let result = harness.service().run(not_cancelled()).await;

    match result {
        Err(error) => assert_eq!(error.exit_code(), 255),
        Ok(summary) => panic!("expected service unavailable, got {summary:?}"),
    }
    assert_eq!(harness.upload_count(), 0);
}

#[tokio::test]
async fn change_set_without_modifications_produces_nothing() {
    let harness = Harness::new(
        vec![
            change(ChangeAction::Add, "NewBucket"),
            change(ChangeAction::Remove, "OldBucket"),
        ],
        vec![finding("CKV_AWS_18", "NewBucket")],
        TestEnricher::default(),
        TestPublisher::default(),
    );

    let summary = harness
        .service()
        .run(not_cancelled())
        .await
        .unwrap_or_else(|error| panic!("run should succeed: {error}"));

    assert_eq!(summary.modified_resources, 0);
    assert_eq!(summary.alerts, 0);
    assert_eq!(summary.publish, PublishOutcome::Skipped);
    assert_eq!(harness.scan_count(), 0);
    assert_eq!(harness.enrich_count(), 0);
    assert!(harness.comments().is_empty());
}

#[tokio::test]
async fn full_run_posts_one_row_per_violation() {
    let harness = Harness::new(
        vec![
            change(ChangeAction::Modify, "AppBucket"),
            change(ChangeAction::Modify, "LogBucket"),
            change(ChangeAction::Modify, "AppBucket"),
            change(ChangeAction::Add, "NewQueue"),
        ],
        vec![
            finding("CKV_AWS_18", "AppBucket"),
            finding("CKV_AWS_21", "AppBucket"),
            finding("CKV_AWS_19", "Untracked"),
        ],
        TestEnricher::default(),
        TestPublisher::default(),
    );

    let summary = harness
        .service()
        .run(not_cancelled())
        .await
        .unwrap_or_else(|error| panic!("run should succeed: {error}"));

    assert!(summary.change_set_name.starts_with("cft-"));
    assert_eq!(summary.change_set_name.len(), 36);
    assert_eq!(summary.change_set_name.matches('-').count(), 1);
    assert_eq!(summary.modified_resources, 2);
    assert_eq!(summary.findings_attached, 2);
    assert_eq!(summary.alerts, 2);
    assert_eq!(summary.publish, PublishOutcome::Posted);

    let uploads = harness
        .change_sets
        .uploads
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_default();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bucket, "templates-bucket");
    assert_eq!(uploads[0].key, "template.yaml");

    let requests = harness
        .change_sets
        .requests
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].stack_name, "app-stack");
    assert_eq!(
        requests[0].template_url,
        "https://templates-bucket.s3.amazonaws.com/template.yaml"
    );
    assert_eq!(requests[0].change_set_name, summary.change_set_name);

    let enriched = harness
        .enricher
        .enriched
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_default();
    assert_eq!(enriched.len(), 2);
    assert_eq!(enriched[0].check_id, "CKV_AWS_18");
    assert_eq!(enriched[1].check_id, "CKV_AWS_21");
    assert_eq!(enriched[0].changes.len(), 2);
    assert_eq!(enriched[0].account, "123456789012");

    let comments = harness.comments();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].0, "/repos/acme/infra/issues/7/comments");
    assert!(comments[0].1.contains("appbucket-physical"));
    assert!(comments[0].1.contains("HIGH"));
    assert!(comments[0].1.contains("LOW"));

    let report = summary
        .report
        .unwrap_or_else(|| panic!("report should be rendered"));
    assert_eq!(report.lines().count(), 4);
}

#[tokio::test]
async fn modified_resources_without_violations_skip_enrichment() {
    let harness = Harness::new(
        vec![change(ChangeAction::Modify, "AppBucket")],
        vec![finding("CKV_AWS_18", "OtherBucket")],
        TestEnricher::default(),
        TestPublisher::default(),
    );

    let summary = harness
        .service()
        .run(not_cancelled())
        .await
        .unwrap_or_else(|error| panic!("run should succeed: {error}"));

    assert_eq!(summary.modified_resources, 1);
    assert_eq!(summary.alerts, 0);
    assert_eq!(harness.scan_count(), 1);
    assert_eq!(harness.enrich_count(), 0);
    assert!(harness.comments().is_empty());
}

#[tokio::test]
async fn enrichment_failure_aborts_without_comment() {
    let harness = Harness::new(
        vec![change(ChangeAction::Modify, "AppBucket")],
        vec![
            finding("CKV_AWS_18", "AppBucket"),
            finding("CKV_AWS_21", "AppBucket"),
        ],
        TestEnricher {
            fail_on_check: Some("CKV_AWS_21".to_owned()),
            ..TestEnricher::default()
        },
        TestPublisher::default(),
    );

    let result = harness.service().run(not_cancelled()).await;

    assert!(matches!(result, Err(AppError::Enrichment(_))));
    assert_eq!(harness.enrich_count(), 1);
    assert!(harness.comments().is_empty());
}

#[tokio::test]
async fn publish_failure_is_reported_not_raised() {
    let harness = Harness::new(
        vec![change(ChangeAction::Modify, "AppBucket")],
        vec![finding("CKV_AWS_18", "AppBucket")],
        TestEnricher::default(),
        TestPublisher {
            fail: true,
            ..TestPublisher::default()
        },
    );

    let summary = harness
        .service()
        .run(not_cancelled())
        .await
        .unwrap_or_else(|error| panic!("run should succeed: {error}"));

    assert!(matches!(summary.publish, PublishOutcome::Failed(ref reason) if reason.contains("502")));
    assert!(summary.report.is_some());
}

#[tokio::test]
async fn cancelled_run_creates_no_change_set() {
    let harness = Harness::new(
        vec![change(ChangeAction::Modify, "AppBucket")],
        Vec::new(),
        TestEnricher::default(),
        TestPublisher::default(),
    );
    let (_sender, receiver) = watch::channel(true);

    let result = harness.service().run(receiver).await;

    assert!(matches!(result, Err(AppError::Cancelled(_))));
    assert_eq!(harness.upload_count(), 0);
}
