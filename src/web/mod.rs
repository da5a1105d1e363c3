//! Web Page Cache Module
//!
//! Caches fetched page bodies for a short fixed window and counts accesses per URL.

mod fetcher;
mod page_cache;

pub use fetcher::{HttpFetcher, PageFetcher};
pub use page_cache::{count_key, page_key, ExpiringPageCache, DEFAULT_PAGE_TTL};
