use async_trait::async_trait;
use driftscan_application::{AlertEnricher, RetryPolicy};
use driftscan_core::{AppError, AppResult};
use driftscan_domain::{Alert, DecoratedAlert};
use reqwest::StatusCode;
use reqwest::header;
use tracing::debug;

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";
const ORIGIN_VALUE: &str = "https://editor.dassana.io";
const REFERER_VALUE: &str = "https://editor.dassana.io/";

/// HTTP client for the risk-scoring enrichment service.
pub struct HttpAlertEnricher {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry_policy: RetryPolicy,
}

impl HttpAlertEnricher {
    /// Creates a new enrichment client for the service at `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            retry_policy,
        }
    }

    fn with_service_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(header::ACCEPT, ACCEPT_VALUE)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, ORIGIN_VALUE)
            .header(header::REFERER, REFERER_VALUE)
            .header("x-api-key", self.api_key.as_str())
            .header("x-dassana-cache", "false")
    }
}

#[async_trait]
impl AlertEnricher for HttpAlertEnricher {
    async fn check_availability(&self) -> AppResult<()> {
        let endpoint = format!("{}/ping", self.base_url);
        let response = self
            .with_service_headers(self.http_client.get(endpoint))
            .send()
            .await
            .map_err(|error| {
                AppError::ServiceUnavailable(format!(
                    "failed to reach enrichment service: {error}"
                ))
            })?;

        if response.status() != StatusCode::OK {
            return Err(AppError::ServiceUnavailable(format!(
                "enrichment service ping returned status {}",
                response.status().as_u16()
            )));
        }

        Ok(())
    }

    async fn enrich(&self, alert: &Alert) -> AppResult<DecoratedAlert> {
        let endpoint = format!(
            "{}/run?includeInputRequest=false&mode=test",
            self.base_url
        );

        let response = crate::http_retry::send_with_retry(
            self.retry_policy,
            "enrichment endpoint",
            || self.with_service_headers(self.http_client.post(endpoint.as_str()).json(alert)),
        )
        .await
        .map_err(AppError::Enrichment)?;

        let decorated = response.json::<DecoratedAlert>().await.map_err(|error| {
            AppError::Enrichment(format!(
                "failed to parse enrichment response for {} / {}: {error}",
                alert.logical_resource_id, alert.check_id
            ))
        })?;
        debug!(
            resource = %alert.logical_resource_id,
            check_id = %alert.check_id,
            resource_id = decorated.resource_id(),
            "decoded enrichment response"
        );

        Ok(decorated)
    }
}
