//! KV Exercises demo
//!
//! Runs the instrumented cache and, when `PAGE_URL` is set, the page cache
//! against the configured backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kv_exercises::cache::STORE_OP;
use kv_exercises::{
    spawn_cleanup_task, Config, ExpiringPageCache, HttpFetcher, InstrumentationOptions,
    InstrumentedCache, KeyValueStore, MemoryStore, RedisStore,
};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to Redis, or create a memory store with its cleanup task
/// 4. Store and read back a few values, then replay the call history
/// 5. Fetch `PAGE_URL` twice through the page cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kv_exercises=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={}, page_ttl={}s, count_calls={}, call_history={}",
        if config.redis_url.is_some() { "redis" } else { "memory" },
        config.page_ttl,
        config.count_calls,
        config.call_history
    );

    let mut cleanup_handle = None;
    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisStore::connect(url)
                .await
                .with_context(|| format!("connecting to {}", url))?,
        ),
        None => {
            let memory = Arc::new(MemoryStore::new());
            cleanup_handle = Some(spawn_cleanup_task(memory.clone(), config.cleanup_interval));
            memory
        }
    };

    let options = InstrumentationOptions {
        count_calls: config.count_calls,
        call_history: config.call_history,
    };
    let cache = InstrumentedCache::new(store.clone(), options).await?;

    let text_key = cache.store("hello").await?;
    let int_key = cache.store(b"42").await?;
    let float_key = cache.store(3.5).await?;

    info!("{} -> {:?}", text_key, cache.retrieve_as_string(&text_key).await?);
    info!("{} -> {:?}", int_key, cache.retrieve_as_integer(&int_key).await?);
    info!("{} -> {:?}", float_key, cache.retrieve_as_float(&float_key).await?);

    cache.replay(STORE_OP).await?;

    if let Some(url) = &config.page_url {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building HTTP client")?;
        let fetcher = Arc::new(HttpFetcher::with_client(client));
        let pages = ExpiringPageCache::new(store.clone(), fetcher).with_ttl(config.page_ttl);

        for _ in 0..2 {
            match pages.fetch(url).await {
                Ok(body) => info!("Fetched {} ({} bytes)", url, body.len()),
                Err(e) => warn!("Fetching {} failed: {}", url, e),
            }
        }
        info!("{} accessed {} times", url, pages.access_count(url).await?);
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
    }
    Ok(())
}
