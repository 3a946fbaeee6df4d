//! JSON-over-HTTP transport shared by the provider clients

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::LlmError;

/// First retry waits this long; each further retry doubles it
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Retry-after assumed when a 429 carries none
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub(super) struct Transport {
    http: Client,
    max_retries: u32,
}

impl Transport {
    pub(super) fn new(timeout_ms: u64, max_retries: u32) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;
        Ok(Self { http, max_retries })
    }

    /// POST `body` and decode the reply as `T`
    ///
    /// Transient failures are retried up to `max_retries` times with
    /// exponential backoff. Rate limits come straight back to the caller.
    pub(super) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
    ) -> Result<T, LlmError> {
        let mut attempt = 0;
        loop {
            match self.try_post(url, headers, body).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let wait = backoff(attempt);
                    warn!(attempt, wait_ms = wait.as_millis() as u64, error = %e, "post_json: retrying");
                    tokio::time::sleep(wait).await;
                }
                result => return result,
            }
        }
    }

    async fn try_post<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
    ) -> Result<T, LlmError> {
        let mut request = self.http.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        debug!(%url, status, "try_post: response");

        if status == 429 {
            return Err(LlmError::RateLimited {
                retry_after: retry_after(&response),
            });
        }
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

fn retry_after(response: &Response) -> Duration {
    let secs = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

fn backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    Duration::from_millis(INITIAL_BACKOFF_MS << exponent)
}
