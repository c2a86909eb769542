//! HTTP transport - abstraction over how requests reach the API
//!
//! The client only ever talks JSON to paths under the base URL, with
//! parameters in the query string (writes included, as the API expects).
//! [`ReqwestTransport`] is the real implementation; tests substitute a mock.

use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::API_VERSION;
use crate::error::{PinballMapError, Result};

/// Query parameters for a request
pub type Params<'a> = [(&'a str, String)];

/// Sends one request and returns the decoded JSON body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Request `path` (relative to the base URL) with query parameters
    ///
    /// Non-success statuses become [`PinballMapError::Http`].
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &Params<'_>,
    ) -> Result<serde_json::Value>;

    /// Absolute URL for `path`, for logging
    fn url(&self, path: &str) -> String;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "pinballmap-rs/{} (api {})",
                env!("CARGO_PKG_VERSION"),
                API_VERSION
            ))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &Params<'_>,
    ) -> Result<serde_json::Value> {
        let url = self.url(path);
        // parameters may carry credentials, so only the bare URL is logged
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method.clone(), &url)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} {} failed with status code {}", method, url, status);
            return Err(PinballMapError::Http {
                status: status.as_u16(),
                url,
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| PinballMapError::decode(format!("response from {url}"), e))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
