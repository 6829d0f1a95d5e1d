use async_trait::async_trait;
use driftscan_core::AppResult;

/// Port resolving the account that owns the credentials in use.
#[async_trait]
pub trait AccountIdentity: Send + Sync {
    /// Returns the account id of the caller.
    async fn account_id(&self) -> AppResult<String>;
}
