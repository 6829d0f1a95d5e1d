use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::error::DisplayErrorContext;
use driftscan_application::AccountIdentity;
use driftscan_core::{AppError, AppResult};

/// Loads the shared AWS configuration for `region` from the default
/// credential chain.
pub async fn load_aws_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .load()
        .await
}

/// Resolves the caller's account through STS.
#[derive(Debug, Clone)]
pub struct AwsAccountIdentity {
    sts: aws_sdk_sts::Client,
}

impl AwsAccountIdentity {
    /// Creates an identity resolver from an already loaded SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            sts: aws_sdk_sts::Client::new(config),
        }
    }
}

#[async_trait]
impl AccountIdentity for AwsAccountIdentity {
    async fn account_id(&self) -> AppResult<String> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "failed to resolve caller identity: {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        output
            .account()
            .filter(|account| !account.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AppError::Provider("caller identity has no account".to_owned()))
    }
}
