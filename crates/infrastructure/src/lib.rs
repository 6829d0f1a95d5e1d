//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aws_account_identity;
mod aws_change_set_provider;
mod checkov_policy_scanner;
mod github_comment_publisher;
mod http_alert_enricher;
mod http_retry;

pub use aws_account_identity::{AwsAccountIdentity, load_aws_config};
pub use aws_change_set_provider::AwsChangeSetProvider;
pub use checkov_policy_scanner::{CheckovPolicyScanner, parse_checkov_output};
pub use github_comment_publisher::GitHubCommentPublisher;
pub use http_alert_enricher::HttpAlertEnricher;
