use async_trait::async_trait;
use driftscan_core::AppResult;
use driftscan_domain::{Alert, DecoratedAlert};

/// Port for the external risk-scoring service.
#[async_trait]
pub trait AlertEnricher: Send + Sync {
    /// Verifies the service is reachable and accepts the configured API key.
    ///
    /// Fails with `AppError::ServiceUnavailable` otherwise.
    async fn check_availability(&self) -> AppResult<()>;

    /// Enriches one alert with contextual risk.
    async fn enrich(&self, alert: &Alert) -> AppResult<DecoratedAlert>;
}
