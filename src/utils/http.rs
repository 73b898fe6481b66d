//! HTTP client utilities.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::retry::{with_retry, RetryConfig};
use crate::sources::SourceError;

/// Default per-request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client with a fixed per-request deadline and transport retries
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    retry: RetryConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_settings(default_user_agent(), DEFAULT_TIMEOUT, RetryConfig::default())
    }

    /// Create a client with a custom user agent, timeout and retry policy
    pub fn with_settings(
        user_agent: &str,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            retry,
        })
    }

    /// GET a URL and parse the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let body = self.get_text(url, &[("Accept", "application/json")]).await?;
        serde_json::from_str(&body).map_err(SourceError::from)
    }

    /// GET a URL and return the body as text
    pub async fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, SourceError> {
        with_retry(self.retry, move || async move {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            tracing::debug!(url, "GET");
            let response = request.send().await.map_err(SourceError::from)?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(SourceError::RateLimit);
            }
            if status == StatusCode::NOT_FOUND {
                return Err(SourceError::NotFound(url.to_string()));
            }
            if !status.is_success() {
                return Err(SourceError::Api {
                    status: status.as_u16(),
                    message: format!("GET {} returned {}", url, status),
                });
            }

            response.text().await.map_err(SourceError::from)
        })
        .await
    }
}

/// User agent advertising this crate
pub fn default_user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}
