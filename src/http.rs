//! JSON-over-HTTP calls with timeout, retry, and exponential backoff.
//!
//! Shared by the OpenAI embedding and generation clients.
//!
//! - HTTP 429 and 5xx → retry
//! - Other 4xx → fail immediately
//! - Network errors (including timeouts) → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};

use scholask_core::RagError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Delay before retry number `attempt` (1-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5))
}

/// Whether a response status is worth retrying.
pub fn is_retryable(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

/// Whether a failed attempt should be followed by another one.
pub fn should_retry(err: &RagError, attempt: u32, max_retries: u32) -> bool {
    err.is_transient() && attempt < max_retries
}

pub fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// POST `body` to `url` with bearer auth.
///
/// `to_error` turns a failure message and its transient flag into the
/// caller's [`RagError`] variant; attempts continue while that error
/// [`is_transient`](RagError::is_transient), up to `max_retries` retries.
pub async fn post_json_with_retry<F>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &serde_json::Value,
    max_retries: u32,
    to_error: F,
) -> Result<serde_json::Value, RagError>
where
    F: Fn(String, bool) -> RagError,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            debug!(url, attempt, delay_secs = delay.as_secs(), "retrying request");
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await;

        let err = match resp {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response
                        .json()
                        .await
                        .map_err(|e| to_error(format!("invalid JSON response: {}", e), false));
                }
                let body_text = response.text().await.unwrap_or_default();
                let transient = is_retryable(status);
                if transient {
                    warn!(url, %status, attempt, "transient API error");
                }
                to_error(format!("API error {}: {}", status, body_text), transient)
            }
            Err(e) => {
                warn!(url, attempt, error = %e, "request failed");
                to_error(e.to_string(), true)
            }
        };

        if !should_retry(&err, attempt, max_retries) {
            return Err(err);
        }
        attempt += 1;
    }
}
