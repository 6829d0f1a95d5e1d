use std::env;
use std::str::FromStr;
use std::time::Duration;

use driftscan_application::{RetryPolicy, WaitPolicy};
use driftscan_core::{AppError, AppResult, NonEmptyString};
use driftscan_domain::{PullRequestRef, RiskAttribution};
use url::Url;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Runtime configuration of one drift analysis run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub pull_request: PullRequestRef,
    pub commit_sha: String,
    pub github_token: String,
    pub github_api_url: String,
    pub enrichment_endpoint: String,
    pub enrichment_api_key: String,
    pub aws_region: String,
    pub bucket_name: String,
    pub stack_name: String,
    pub template_file: String,
    pub checkov_binary: String,
    pub wait_policy: WaitPolicy,
    pub enrichment_retry: RetryPolicy,
    pub publish_retry: RetryPolicy,
    pub http_timeout: Duration,
    pub risk_attribution: RiskAttribution,
}

impl RunnerConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(|name| env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which returns the raw value of
    /// a variable when it is set.
    pub fn load_from<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let repository = required(&lookup, "GITHUB_REPOSITORY")?;
        let raw_pull_request = required(&lookup, "GITHUB_PR")?;
        let pull_request_number = raw_pull_request
            .as_str()
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|number| *number > 0)
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "GITHUB_PR must be a positive integer, got '{}'",
                    raw_pull_request.as_str()
                ))
            })?;
        let pull_request = PullRequestRef::new(String::from(repository), pull_request_number)
            .map_err(|error| AppError::Configuration(format!("GITHUB_REPOSITORY: {error}")))?;

        let commit_sha = required(&lookup, "GITHUB_SHA")?.into();
        let github_token = required(&lookup, "GITHUB_TOKEN")?.into();
        let enrichment_endpoint = base_url(
            "API_GATEWAY_ENDPOINT",
            required(&lookup, "API_GATEWAY_ENDPOINT")?.as_str(),
        )?;
        let enrichment_api_key = required(&lookup, "API_KEY")?.into();
        let aws_region = required(&lookup, "INPUT_AWS_REGION")?.into();
        let bucket_name = required(&lookup, "INPUT_BUCKET_NAME")?.into();
        let stack_name = required(&lookup, "INPUT_STACK_NAME")?.into();
        let template_file = required(&lookup, "INPUT_TEMPLATE_FILE")?.into();

        let github_api_url = base_url(
            "GITHUB_API_URL",
            optional(&lookup, "GITHUB_API_URL")
                .as_deref()
                .unwrap_or(DEFAULT_GITHUB_API_URL),
        )?;
        let checkov_binary =
            optional(&lookup, "CHECKOV_BIN").unwrap_or_else(|| "checkov".to_owned());

        let poll_interval_secs = positive::<u64, _>(&lookup, "CHANGE_SET_POLL_INTERVAL_SECS", 5)?;
        let max_polls = positive::<u32, _>(&lookup, "CHANGE_SET_MAX_POLLS", 50)?;
        let enrichment_max_attempts = positive::<u8, _>(&lookup, "ENRICHMENT_MAX_ATTEMPTS", 3)?;
        let enrichment_backoff_ms =
            positive::<u64, _>(&lookup, "ENRICHMENT_RETRY_BACKOFF_MS", 500)?;
        let publish_max_attempts = positive::<u8, _>(&lookup, "PUBLISH_MAX_ATTEMPTS", 3)?;
        let publish_backoff_ms = positive::<u64, _>(&lookup, "PUBLISH_RETRY_BACKOFF_MS", 500)?;
        let http_timeout_secs = positive::<u64, _>(&lookup, "HTTP_TIMEOUT_SECS", 30)?;

        let risk_attribution = optional(&lookup, "REPORT_RISK_ATTRIBUTION")
            .map(|value| {
                RiskAttribution::from_str(value.as_str()).map_err(|error| {
                    AppError::Configuration(format!("REPORT_RISK_ATTRIBUTION: {error}"))
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            pull_request,
            commit_sha,
            github_token,
            github_api_url,
            enrichment_endpoint,
            enrichment_api_key,
            aws_region,
            bucket_name,
            stack_name,
            template_file,
            checkov_binary,
            wait_policy: WaitPolicy {
                poll_interval: Duration::from_secs(poll_interval_secs),
                max_polls,
            },
            enrichment_retry: RetryPolicy::new(
                enrichment_max_attempts,
                Duration::from_millis(enrichment_backoff_ms),
            ),
            publish_retry: RetryPolicy::new(
                publish_max_attempts,
                Duration::from_millis(publish_backoff_ms),
            ),
            http_timeout: Duration::from_secs(http_timeout_secs),
            risk_attribution,
        })
    }
}

fn required<F>(lookup: &F, name: &str) -> AppResult<NonEmptyString>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name)
        .ok_or_else(|| AppError::Configuration(format!("{name} is required")))?;

    NonEmptyString::new(value.trim())
        .map_err(|_| AppError::Configuration(format!("{name} must not be blank")))
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn positive<T, F>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = optional(lookup, name) else {
        return Ok(default);
    };

    let parsed = value.parse::<T>().map_err(|error| {
        AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
    })?;
    if parsed <= T::default() {
        return Err(AppError::Configuration(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(parsed)
}

fn base_url(name: &str, value: &str) -> AppResult<String> {
    let url = Url::parse(value)
        .map_err(|error| AppError::Configuration(format!("invalid {name} '{value}': {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Configuration(format!(
            "{name} must be an http(s) URL, got '{value}'"
        )));
    }

    Ok(value.trim_end_matches('/').to_owned())
}
