use async_trait::async_trait;
use driftscan_application::{CommentPublisher, RetryPolicy};
use driftscan_core::{AppError, AppResult};
use driftscan_domain::PullRequestRef;
use reqwest::header;
use serde::Serialize;

const USER_AGENT_VALUE: &str = concat!("driftscan/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct CreateIssueCommentRequest<'a> {
    body: &'a str,
}

/// Posts pull request comments through the GitHub REST API.
pub struct GitHubCommentPublisher {
    http_client: reqwest::Client,
    api_base_url: String,
    token: String,
    retry_policy: RetryPolicy,
}

impl GitHubCommentPublisher {
    /// Creates a new publisher against `api_base_url`, e.g. `https://api.github.com`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        api_base_url: impl Into<String>,
        token: impl Into<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            http_client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            retry_policy,
        }
    }
}

#[async_trait]
impl CommentPublisher for GitHubCommentPublisher {
    async fn publish_comment(&self, pull_request: &PullRequestRef, body: &str) -> AppResult<()> {
        let endpoint = format!("{}{}", self.api_base_url, pull_request.comments_path());
        let payload = CreateIssueCommentRequest { body };

        crate::http_retry::send_with_retry(self.retry_policy, "comment endpoint", || {
            self.http_client
                .post(endpoint.as_str())
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
                .header(header::ACCEPT, "application/vnd.github+json")
                .header(header::USER_AGENT, USER_AGENT_VALUE)
                .header("X-GitHub-Api-Version", "2022-11-28")
                .json(&payload)
        })
        .await
        .map_err(AppError::Publish)?;

        Ok(())
    }
}
