//! Expiring Page Cache
//!
//! Read-through cache for page bodies; expiry is left to the store's TTL.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{decode_int, decode_utf8};
use crate::error::Result;
use crate::store::KeyValueStore;
use crate::web::PageFetcher;

/// Seconds a fetched page stays cached.
pub const DEFAULT_PAGE_TTL: u64 = 10;

/// Store key of the access counter for `url`.
pub fn count_key(url: &str) -> String {
    format!("count:{}", url)
}

/// Store key of the cached body for `url`.
pub fn page_key(url: &str) -> String {
    format!("html:{}", url)
}

// == Expiring Page Cache ==
/// Per URL, an entry is either absent or cached; it returns to absent when the
/// store expires it.
#[derive(Clone)]
pub struct ExpiringPageCache {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn PageFetcher>,
    ttl_seconds: u64,
}

impl ExpiringPageCache {
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            store,
            fetcher,
            ttl_seconds: DEFAULT_PAGE_TTL,
        }
    }

    /// Overrides the expiry window.
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    // == Fetch ==
    /// Returns the body of `url`, from the cache when a live, non-empty copy exists.
    ///
    /// The access counter is bumped first, on hits, misses and failed fetches
    /// alike. Fetch errors propagate and nothing is cached for them.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let count = self.store.increment(&count_key(url)).await?;

        let key = page_key(url);
        // An empty cached body counts as a miss and is fetched again
        if let Some(cached) = self.store.get(&key).await?.filter(|body| !body.is_empty()) {
            debug!("Page cache hit for {} (access #{})", url, count);
            return decode_utf8(cached);
        }

        info!("Page cache miss for {} (access #{}), fetching", url, count);
        let content = self.fetcher.fetch(url).await?;
        self.store
            .set_with_expiry(&key, content.as_bytes(), self.ttl_seconds)
            .await?;
        Ok(content)
    }

    /// Number of `fetch` calls made for `url`.
    pub async fn access_count(&self, url: &str) -> Result<u64> {
        match self.store.get(&count_key(url)).await? {
            Some(raw) => Ok(decode_int(raw)?.max(0) as u64),
            None => Ok(0),
        }
    }
}

impl std::fmt::Debug for ExpiringPageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringPageCache")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}
