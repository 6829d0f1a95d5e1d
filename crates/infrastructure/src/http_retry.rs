use driftscan_application::RetryPolicy;
use tracing::warn;

/// Sends a request built by `build` until it succeeds or the policy is exhausted.
///
/// Transport errors, 5xx and 429 responses are retried with the policy's
/// backoff. Any other non-success status fails immediately. The error string
/// describes the last failure.
pub(crate) async fn send_with_retry<F>(
    policy: RetryPolicy,
    operation: &str,
    mut build: F,
) -> Result<reqwest::Response, String>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut attempt = 0_u8;
    let mut last_error: Option<String> = None;

    while attempt < policy.max_attempts() {
        attempt = attempt.saturating_add(1);

        match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response)
                if response.status().is_server_error()
                    || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
            {
                last_error = Some(format!(
                    "{operation} returned transient status {}",
                    response.status().as_u16()
                ));
            }
            Ok(response) => {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                return Err(format!(
                    "{operation} returned status {}: {body}",
                    status.as_u16()
                ));
            }
            Err(error) => {
                last_error = Some(format!("{operation} transport error: {error}"));
            }
        }

        if policy.allows_retry_after(attempt) {
            warn!(
                operation,
                attempt,
                max_attempts = policy.max_attempts(),
                error = last_error.as_deref().unwrap_or_default(),
                "retrying outbound call"
            );
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| format!("{operation} exhausted retries")))
}
