//! Page Fetcher
//!
//! The network side of the page cache.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;

/// Retrieves the textual content of a resource.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

// == HTTP Fetcher ==
/// Plain HTTP GET; non-success statuses are errors.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (timeouts, proxies, headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response.text().await?)
    }
}
