use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::shared::config::{AgendorConfig, RetryConfig};

/// Upstream fetch failures. Fatal at startup: without deals there is no dashboard.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("malformed response envelope from {url}: {reason}")]
    Envelope { url: String, reason: String },
}

/// Source of raw deal records. Records are opaque JSON until normalized.
#[async_trait]
pub trait DealSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<serde_json::Value>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff_ms: config.initial_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with jitter; a numeric Retry-After wins, capped at 30s
    fn delay(&self, attempt: u32, retry_after: Option<&HeaderValue>) -> Duration {
        if let Some(value) = retry_after.and_then(|v| v.to_str().ok()) {
            if let Ok(secs) = value.trim().parse::<u64>() {
                return Duration::from_secs(secs.min(30));
            }
        }

        let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
        let base = self
            .initial_backoff_ms
            .saturating_mul(exponent)
            .min(self.max_backoff_ms);
        let jitter = rand::thread_rng().gen_range(0..150u64);
        Duration::from_millis(base.saturating_add(jitter))
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// HTTP-клиент для Agendor CRM API (deals listing)
pub struct AgendorApiClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    authorization: String,
    retry: RetryPolicy,
}

impl AgendorApiClient {
    pub fn new(config: &AgendorConfig, retry: RetryPolicy) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            page_size: config.page_size,
            authorization: format!("{} {}", config.auth_scheme, config.api_token),
            retry,
        })
    }

    /// Walk every page, starting at the base URL and following `links.next`.
    /// A `next` link that points at an already fetched page is an envelope error.
    pub async fn fetch_all_deals(&self) -> Result<Vec<serde_json::Value>, TransportError> {
        let mut deals = Vec::new();
        let mut visited = HashSet::new();
        let mut next_url = Some(self.base_url.clone());
        let mut page_no = 0u32;

        while let Some(url) = next_url {
            if !visited.insert(url.clone()) {
                return Err(TransportError::Envelope {
                    reason: format!("pagination loop: next link {} was already fetched", url),
                    url,
                });
            }
            page_no += 1;
            page_no += 1;
            // The first request carries the page size; `next` links already encode it
            let page = if page_no == 1 {
                self.fetch_page(&url, &[("per_page", self.page_size.to_string())])
                    .await?
            } else {
                self.fetch_page(&url, &[]).await?
            };

            tracing::info!(
                "Agendor API: page {} returned {} deals ({} so far)",
                page_no,
                page.data.len(),
                deals.len() + page.data.len()
            );

            next_url = page.next_url();
            deals.extend(page.data);
        }

        tracing::info!("Agendor API: fetched {} deals in {} pages", deals.len(), page_no);
        Ok(deals)
    }

    async fn fetch_page(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<DealsPage, TransportError> {
        let response = self.send_with_retry(url, query).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Agendor API request failed: {} {}", status, body);
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str::<DealsPage>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            tracing::error!("Failed to parse Agendor envelope: {}. Body: {}", e, preview);
            TransportError::Envelope {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })
    }

    async fn send_with_retry(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, TransportError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let request = self
                .client
                .get(url)
                .header(AUTHORIZATION, &self.authorization)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json")
                .query(query);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && attempt < attempts {
                        let delay = self.retry.delay(attempt, response.headers().get(RETRY_AFTER));
                        tracing::warn!(
                            "Agendor API retry {}/{} after status {} (sleep {:?})",
                            attempt,
                            attempts,
                            status,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect()) && attempt < attempts {
                        let delay = self.retry.delay(attempt, None);
                        tracing::warn!(
                            "Agendor API retry {}/{} after transport error: {} (sleep {:?})",
                            attempt,
                            attempts,
                            err,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(TransportError::Request {
                        url: url.to_string(),
                        source: err,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl DealSource for AgendorApiClient {
    async fn fetch_all(&self) -> Result<Vec<serde_json::Value>, TransportError> {
        self.fetch_all_deals().await
    }
}

// ============================================================================
// Response envelope
// ============================================================================

/// One page of GET /v3/deals
#[derive(Debug, Clone, Deserialize)]
pub struct DealsPage {
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub links: Option<PageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageLinks {
    /// URL of the next page; Agendor sends `null` (or `false`) on the last one
    #[serde(default)]
    pub next: Option<serde_json::Value>,
}

impl DealsPage {
    pub fn next_url(&self) -> Option<String> {
        match self.links.as_ref().and_then(|links| links.next.as_ref()) {
            Some(serde_json::Value::String(url)) if !url.trim().is_empty() => Some(url.clone()),
            _ => None,
        }
    }
}
