//! Configuration Module
//!
//! Loads the demo's backend and instrumentation settings from environment variables.

use std::env;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
    /// Expiry window in seconds for cached pages
    pub page_ttl: u64,
    /// In-memory store sweep interval in seconds
    pub cleanup_interval: u64,
    /// Count calls to instrumented operations
    pub count_calls: bool,
    /// Record argument/result history of instrumented operations
    pub call_history: bool,
    /// Page fetched through the page cache by the demo binary
    pub page_url: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis server URL (default: unset, memory backend)
    /// - `PAGE_TTL` - Page cache expiry in seconds (default: 10)
    /// - `CLEANUP_INTERVAL` - Memory store sweep frequency in seconds (default: 1)
    /// - `COUNT_CALLS` - Enable call counting (default: true)
    /// - `CALL_HISTORY` - Enable call history (default: true)
    /// - `PAGE_URL` - Page for the demo to fetch (default: unset, skipped)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            page_ttl: env::var("PAGE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.page_ttl),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            count_calls: env::var("COUNT_CALLS")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.count_calls),
            call_history: env::var("CALL_HISTORY")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.call_history),
            page_url: env::var("PAGE_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            page_ttl: 10,
            cleanup_interval: 1,
            count_calls: true,
            call_history: true,
            page_url: None,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
