//! HTTP layer: status mapping, retry, FetchOutcome.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, IF_NONE_MATCH};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::error::{HubError, HubResult};
use crate::repo::RepoId;
use crate::types::{ArtifactHeaders, HubConfig};

/// Outcome of an artifact fetch (`NotModified` only for 304).
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    NotModified,
    Fetched(ArtifactFetched),
}

#[derive(Debug)]
pub(crate) struct ArtifactFetched {
    pub headers: ArtifactHeaders,
    pub content: String,
}

/// Request body, rebuilt on every retry attempt.
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Json(serde_json::Value),
    Text(String),
}

/// HTTP backend for making requests (holds reqwest client, auth, config).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) token_provider: TokenProvider,
    pub(crate) config: HubConfig,
}

impl HttpBackend {
    /// Fetch artifact content; returns FetchOutcome (NotModified only for 304).
    pub(crate) async fn fetch_artifact(
        &self,
        url: &str,
        repo: &RepoId,
        etag: Option<&str>,
    ) -> HubResult<FetchOutcome> {
        let response = self
            .request(reqwest::Method::GET, url, repo, etag, None)
            .await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            debug!("artifact not modified (304)");
            return Ok(FetchOutcome::NotModified);
        }

        let headers = ArtifactHeaders::from_headers(response.headers());
        let content = response.text().await.map_err(|e| HubError::Network {
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(FetchOutcome::Fetched(ArtifactFetched { headers, content }))
    }

    /// Make a request, retrying transient failures with backoff + jitter.
    pub(crate) async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        repo: &RepoId,
        etag: Option<&str>,
        payload: Option<&Payload>,
    ) -> HubResult<reqwest::Response> {
        let mut retries = 0;
        let max_retries = self.config.max_retries;

        loop {
            let result = self
                .request_once(method.clone(), url, repo, etag, payload)
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = backoff_delay(&e, retries);

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(
        &self,
        method: reqwest::Method,
        url: &str,
        repo: &RepoId,
        etag: Option<&str>,
        payload: Option<&Payload>,
    ) -> HubResult<reqwest::Response> {
        let mut request = self.client.request(method, url);

        if let Some(token) = self.token_provider.get_token().await? {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        request = match payload {
            Some(Payload::Json(value)) => request.json(value),
            Some(Payload::Text(body)) => request.body(body.clone()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 | 304 => Ok(response),

            401 | 403 => Err(HubError::Unauthorized {
                message: format!("HTTP {}: invalid token or missing permission", status.as_u16()),
            }),

            404 => Err(HubError::NotFound {
                repo: repo.to_string(),
            }),

            409 => Err(HubError::AlreadyExists {
                repo: repo.to_string(),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(HubError::RateLimited { retry_after })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(HubError::Network {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }
        }
    }
}

/// Backoff for the next retry attempt, jittered and capped at 30s.
///
/// A rate-limit response with a Retry-After header is honored (capped);
/// everything else gets exponential backoff. The shift is clamped so an
/// arbitrarily large configured retry count cannot overflow.
fn backoff_delay(error: &HubError, retries: u32) -> Duration {
    use rand::Rng;

    match error {
        HubError::RateLimited {
            retry_after: Some(retry_after),
        } => {
            let capped = (*retry_after).min(Duration::from_secs(30));
            let base_ms = capped.as_millis() as u64;
            let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
            Duration::from_millis(jittered_ms.max(100))
        }
        _ => {
            let base_backoff = Duration::from_secs(1u64 << retries.min(5));
            let base_backoff = base_backoff.min(Duration::from_secs(30));
            let jittered_ms = rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
            Duration::from_millis(jittered_ms.max(10))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_capped_for_large_retry_counts() {
        let err = HubError::Network {
            message: "connection reset".to_string(),
        };

        for retries in [1, 5, 6, 63, 64, u32::MAX] {
            let delay = backoff_delay(&err, retries);
            assert!(
                delay <= Duration::from_secs(30),
                "retries={}: delay {:?} exceeds cap",
                retries,
                delay
            );
        }
    }

    #[test]
    fn test_backoff_honors_retry_after_with_cap() {
        let err = HubError::RateLimited {
            retry_after: Some(Duration::from_secs(5)),
        };
        let delay = backoff_delay(&err, 1);
        assert!(delay >= Duration::from_millis(4500));
        assert!(delay <= Duration::from_millis(5500));

        // A huge Retry-After is capped before jitter.
        let err = HubError::RateLimited {
            retry_after: Some(Duration::from_secs(600)),
        };
        let delay = backoff_delay(&err, 1);
        assert!(delay <= Duration::from_secs(33));
    }
}
