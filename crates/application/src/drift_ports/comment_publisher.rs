use async_trait::async_trait;
use driftscan_core::AppResult;
use driftscan_domain::PullRequestRef;

/// Port for posting pull request comments.
#[async_trait]
pub trait CommentPublisher: Send + Sync {
    /// Posts a new comment; never updates earlier ones.
    async fn publish_comment(&self, pull_request: &PullRequestRef, body: &str) -> AppResult<()>;
}
