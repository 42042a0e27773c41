//! HTTP client for fetching remote artifacts
//!
//! Composes the fetch concerns as independent layers: a per-request
//! timeout around one fetch, and a retry-with-backoff wrapper around the
//! timed fetch. The circuit-breaker gate lives with the live driver; the
//! retry wrapper only feeds it by counting every failed attempt into the
//! shared failure counter.
//!
//! Retries apply only to transient upstream failures: HTTP 429 (honoring
//! `Retry-After`, capped), HTTP 5xx and network/timeout errors. Everything
//! else is reported immediately, never retried.

use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;

use crate::contracts::{Evidence, Reason, ReasonCode};

/// Configuration for the artifact client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Total attempts per artifact (first try plus retries)
    pub max_attempts: u32,

    /// Fixed backoff between retry attempts in milliseconds
    pub backoff_ms: u64,

    /// Upper bound honored for a Retry-After header, in milliseconds
    pub retry_after_cap_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 4_000,
            max_attempts: 3,
            backoff_ms: 1_000,
            retry_after_cap_ms: 10_000,
        }
    }
}

/// One failed artifact fetch
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("network error fetching {url}: {detail}")]
    Network { url: String, detail: String },

    #[error("{url} answered status {status}")]
    Status {
        url: String,
        status: u16,
        retry_after_ms: Option<u64>,
    },

    #[error("{url} returned a body that is not JSON: {detail}")]
    Parse { url: String, detail: String },
}

impl FetchError {
    /// Whether the retry wrapper may try again
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Network { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Parse { .. } => false,
        }
    }

    /// Classify the terminal failure into the taxonomy
    ///
    /// Timeouts and transport exceptions are `NETWORK_TIMEOUT`; a body
    /// that is not JSON is `JSON_PARSE_ERROR`; any HTTP status failure is
    /// `UPSTREAM_ERROR`.
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            FetchError::Timeout { .. } | FetchError::Network { .. } => ReasonCode::NetworkTimeout,
            FetchError::Status { .. } => ReasonCode::UpstreamError,
            FetchError::Parse { .. } => ReasonCode::JsonParseError,
        }
    }

    /// Build the evidence-backed block error for this failure
    pub fn into_reason(self) -> Reason {
        let code = self.reason_code();
        let (message, evidence) = match self {
            FetchError::Timeout { url, timeout_ms } => (
                format!("fetch timed out after {}ms", timeout_ms),
                Evidence::new(
                    "exception",
                    url,
                    json!({ "timeoutMs": timeout_ms }),
                    "request aborted by the per-request timeout",
                ),
            ),
            FetchError::Network { url, detail } => (
                "fetch failed at the transport layer".to_string(),
                Evidence::new(
                    "exception",
                    url,
                    Value::String(detail),
                    "network error raised by the HTTP client",
                ),
            ),
            FetchError::Status { url, status, .. } => (
                format!("upstream answered status {}", status),
                Evidence::new(
                    "http-status",
                    url,
                    json!(status),
                    "non-success status after retries were exhausted",
                ),
            ),
            FetchError::Parse { url, detail } => (
                "artifact body is not valid JSON".to_string(),
                Evidence::new(
                    "exception",
                    url,
                    Value::String(detail),
                    "successful response failed JSON parsing",
                ),
            ),
        };
        Reason::evidenced(code, message, vec![evidence])
    }
}

/// HTTP client for artifact fetches
pub struct ArtifactClient {
    client: Client,
    config: ClientConfig,
}

impl ArtifactClient {
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// One timed fetch attempt
    pub async fn fetch_artifact(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    FetchError::Network {
                        url: url.to_string(),
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = parse_retry_after(&response);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                retry_after_ms,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.config.timeout_ms,
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        serde_json::from_str(&body).map_err(|e| FetchError::Parse {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }

    /// Retry wrapper around the timed fetch
    ///
    /// Every failed attempt (retried or terminal) increments `failures`,
    /// the counter the live driver's circuit breaker gates on. A parse
    /// failure is a broken artifact, not an unhealthy upstream: it neither
    /// retries nor counts toward the breaker.
    pub async fn fetch_with_retry(
        &self,
        url: &str,
        failures: &AtomicU32,
    ) -> Result<Value, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_artifact(url).await {
                Ok(doc) => return Ok(doc),
                Err(error) => {
                    if matches!(error, FetchError::Parse { .. }) {
                        return Err(error);
                    }

                    failures.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(
                        url = url,
                        attempt = attempt,
                        error = %error,
                        "artifact fetch attempt failed"
                    );

                    if !error.is_retryable() || attempt >= self.config.max_attempts {
                        return Err(error);
                    }

                    sleep(self.retry_delay(&error)).await;
                }
            }
        }
    }

    /// Backoff before the next attempt: a 429's Retry-After (capped) when
    /// present, the fixed backoff otherwise
    fn retry_delay(&self, error: &FetchError) -> Duration {
        if let FetchError::Status {
            status: 429,
            retry_after_ms: Some(after_ms),
            ..
        } = error
        {
            return Duration::from_millis((*after_ms).min(self.config.retry_after_cap_ms));
        }
        Duration::from_millis(self.config.backoff_ms)
    }
}

/// Retry-After header in milliseconds, when present as delta-seconds
fn parse_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|seconds| seconds * 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16, retry_after_ms: Option<u64>) -> FetchError {
        FetchError::Status {
            url: "http://x/a.json".to_string(),
            status,
            retry_after_ms,
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(status_error(429, None).is_retryable());
        assert!(status_error(500, None).is_retryable());
        assert!(status_error(503, None).is_retryable());
        assert!(!status_error(404, None).is_retryable());
        assert!(!status_error(401, None).is_retryable());
        assert!(FetchError::Timeout {
            url: "u".to_string(),
            timeout_ms: 1
        }
        .is_retryable());
        assert!(!FetchError::Parse {
            url: "u".to_string(),
            detail: "d".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(
            status_error(500, None).reason_code(),
            ReasonCode::UpstreamError
        );
        assert_eq!(
            FetchError::Timeout {
                url: "u".to_string(),
                timeout_ms: 1
            }
            .reason_code(),
            ReasonCode::NetworkTimeout
        );
        assert_eq!(
            FetchError::Network {
                url: "u".to_string(),
                detail: "reset".to_string()
            }
            .reason_code(),
            ReasonCode::NetworkTimeout
        );
        assert_eq!(
            FetchError::Parse {
                url: "u".to_string(),
                detail: "eof".to_string()
            }
            .reason_code(),
            ReasonCode::JsonParseError
        );
    }

    #[test]
    fn test_retry_delay_honors_capped_retry_after() {
        let client = ArtifactClient::new(ClientConfig {
            backoff_ms: 1_000,
            retry_after_cap_ms: 10_000,
            ..Default::default()
        });

        let short = client.retry_delay(&status_error(429, Some(2_000)));
        assert_eq!(short, Duration::from_millis(2_000));

        let long = client.retry_delay(&status_error(429, Some(60_000)));
        assert_eq!(long, Duration::from_millis(10_000));

        let server_error = client.retry_delay(&status_error(500, None));
        assert_eq!(server_error, Duration::from_millis(1_000));
    }

    #[test]
    fn test_into_reason_carries_evidence() {
        let reason = status_error(503, None).into_reason();
        assert_eq!(reason.code(), ReasonCode::UpstreamError);
        assert_eq!(reason.evidence().len(), 1);
        assert_eq!(reason.evidence()[0].kind(), "http-status");
    }
}
