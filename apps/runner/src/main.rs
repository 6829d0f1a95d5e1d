//! driftscan pull request drift-risk runner.

#![forbid(unsafe_code)]

mod runner_config;

use std::process::ExitCode;
use std::sync::Arc;

use driftscan_application::{
    DriftAnalysisPorts, DriftAnalysisService, DriftAnalysisSettings, PublishOutcome, RunSummary,
};
use driftscan_core::{AppError, AppResult};
use driftscan_infrastructure::{
    AwsAccountIdentity, AwsChangeSetProvider, CheckovPolicyScanner, GitHubCommentPublisher,
    HttpAlertEnricher, load_aws_config,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::runner_config::RunnerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(summary) => {
            log_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = %error, exit_code = error.exit_code(), "drift analysis failed");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> AppResult<RunSummary> {
    let config = RunnerConfig::load()?;
    info!(
        repository = %config.pull_request.repository(),
        pull_request = config.pull_request.number(),
        commit = %config.commit_sha,
        stack = %config.stack_name,
        region = %config.aws_region,
        risk_attribution = config.risk_attribution.as_str(),
        "driftscan started"
    );

    let service = build_service(&config).await?;

    let (cancel_sender, cancel_receiver) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("shutdown signal received, cancelling run");
        let _ = cancel_sender.send(true);
    });

    service.run(cancel_receiver).await
}

async fn build_service(config: &RunnerConfig) -> AppResult<DriftAnalysisService> {
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let aws_config = load_aws_config(config.aws_region.as_str()).await;

    let ports = DriftAnalysisPorts {
        change_sets: Arc::new(AwsChangeSetProvider::new(&aws_config)),
        identity: Arc::new(AwsAccountIdentity::new(&aws_config)),
        scanner: Arc::new(CheckovPolicyScanner::new(config.checkov_binary.as_str())),
        enricher: Arc::new(HttpAlertEnricher::new(
            http_client.clone(),
            config.enrichment_endpoint.as_str(),
            config.enrichment_api_key.as_str(),
            config.enrichment_retry,
        )),
        publisher: Arc::new(GitHubCommentPublisher::new(
            http_client,
            config.github_api_url.as_str(),
            config.github_token.as_str(),
            config.publish_retry,
        )),
    };

    let settings = DriftAnalysisSettings {
        stack_name: config.stack_name.clone(),
        bucket: config.bucket_name.clone(),
        template_file: config.template_file.clone(),
        region: config.aws_region.clone(),
        pull_request: config.pull_request.clone(),
        wait_policy: config.wait_policy,
        risk_attribution: config.risk_attribution,
    };

    Ok(DriftAnalysisService::new(ports, settings))
}

fn log_summary(summary: &RunSummary) {
    match &summary.publish {
        PublishOutcome::Failed(reason) => warn!(
            change_set = %summary.change_set_name,
            modified_resources = summary.modified_resources,
            alerts = summary.alerts,
            reason = %reason,
            "drift analysis finished, report was not posted"
        ),
        outcome => info!(
            change_set = %summary.change_set_name,
            modified_resources = summary.modified_resources,
            findings = summary.findings_attached,
            alerts = summary.alerts,
            posted = matches!(outcome, PublishOutcome::Posted),
            "drift analysis finished"
        ),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
