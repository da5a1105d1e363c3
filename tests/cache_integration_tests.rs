//! Integration Tests
//!
//! Exercises the caches and document helpers through the public API, sharing
//! one store the way the demo binary does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kv_exercises::cache::STORE_OP;
use kv_exercises::documents::{
    insert_school, list_all, schools_by_topic, top_students, update_topics, MemoryCollection,
};
use kv_exercises::web::{count_key, page_key};
use kv_exercises::{
    CacheError, ExpiringPageCache, InstrumentationOptions, InstrumentedCache, KeyValueStore,
    MemoryStore, PageFetcher, RedisStore, Result,
};
use serde_json::json;

// == Helper Types ==

#[derive(Default)]
struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{} body {}", url, n))
    }
}

// == Instrumented Cache ==

#[tokio::test]
async fn test_store_scenario() {
    let store = Arc::new(MemoryStore::new());
    let cache = InstrumentedCache::new(store, InstrumentationOptions::default())
        .await
        .unwrap();

    let k = cache.store("hello").await.unwrap();
    assert_eq!(
        cache.retrieve_as_string(&k).await.unwrap().as_deref(),
        Some("hello")
    );

    let n = cache.store(b"42").await.unwrap();
    assert_eq!(cache.retrieve_as_integer(&n).await.unwrap(), Some(42));

    assert_eq!(cache.call_count(STORE_OP).await.unwrap(), 2);
    let history = cache.history(STORE_OP).await.unwrap();
    assert_eq!(history[0].result(), Some(k.as_str()));
    assert_eq!(history[1].result(), Some(n.as_str()));
}

#[tokio::test]
async fn test_new_session_discards_previous_session() {
    let store = Arc::new(MemoryStore::new());

    let first = InstrumentedCache::new(store.clone(), InstrumentationOptions::default())
        .await
        .unwrap();
    let old_key = first.store("stale").await.unwrap();

    let second = InstrumentedCache::new(store.clone(), InstrumentationOptions::default())
        .await
        .unwrap();

    assert_eq!(second.retrieve(&old_key).await.unwrap(), None);
    assert_eq!(second.call_count(STORE_OP).await.unwrap(), 0);
}

#[tokio::test]
async fn test_counter_only_instrumentation() {
    let store = Arc::new(MemoryStore::new());
    let options = InstrumentationOptions {
        count_calls: true,
        call_history: false,
    };
    let cache = InstrumentedCache::new(store.clone(), options).await.unwrap();

    cache.store(1).await.unwrap();
    cache.store(2).await.unwrap();

    assert_eq!(cache.call_count(STORE_OP).await.unwrap(), 2);
    assert!(cache.history(STORE_OP).await.unwrap().is_empty());
    // two values plus the counter
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn test_wrong_decoder_is_an_error_not_absent() {
    let cache = InstrumentedCache::new(
        Arc::new(MemoryStore::new()),
        InstrumentationOptions::disabled(),
    )
    .await
    .unwrap();

    let key = cache.store(vec![0xff, 0x00]).await.unwrap();

    assert!(matches!(
        cache.retrieve_as_string(&key).await,
        Err(CacheError::Decode(_))
    ));
}

// == Page Cache ==

#[tokio::test]
async fn test_page_cache_shares_store_with_cache() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let cache = InstrumentedCache::new(store.clone(), InstrumentationOptions::default())
        .await
        .unwrap();
    let fetcher = Arc::new(CountingFetcher::default());
    let pages = ExpiringPageCache::new(store.clone(), fetcher.clone()).with_ttl(1);

    let url = "http://slowwly.example/delay/1000";
    let a = pages.fetch(url).await.unwrap();
    let b = pages.fetch(url).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(store.get(&page_key(url)).await.unwrap(), None);

    let c = pages.fetch(url).await.unwrap();
    assert_ne!(a, c);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.get(&count_key(url)).await.unwrap(), Some(b"3".to_vec()));

    // Page keys do not disturb the cache's own bookkeeping
    cache.store("x").await.unwrap();
    assert_eq!(cache.call_count(STORE_OP).await.unwrap(), 1);
}

// == Documents ==

#[tokio::test]
async fn test_school_workflow() {
    let schools = MemoryCollection::new();

    insert_school(&schools, json!({"name": "Holberton school", "address": "972 Mission street"}))
        .await
        .unwrap();
    insert_school(&schools, json!({"name": "UCSF", "address": "505 Parnassus Ave"}))
        .await
        .unwrap();
    update_topics(&schools, "Holberton school", &["iOS", "React"])
        .await
        .unwrap();

    assert_eq!(list_all(&schools).await.unwrap().len(), 2);
    let react = schools_by_topic(&schools, "React").await.unwrap();
    assert_eq!(react.len(), 1);
    assert_eq!(react[0]["address"], "972 Mission street");
}

#[tokio::test]
async fn test_top_students() {
    let students = MemoryCollection::new();
    for (name, scores) in [("Alice", vec![80, 100]), ("Carl", vec![95]), ("Dora", vec![10, 20])] {
        let scores: Vec<_> = scores.into_iter().map(|s| json!({"score": s})).collect();
        insert_school(&students, json!({"name": name, "scores": scores}))
            .await
            .unwrap();
    }

    let ranked = top_students(&students).await.unwrap();
    let averages: Vec<f64> = ranked
        .iter()
        .map(|d| d["averageScore"].as_f64().unwrap())
        .collect();

    assert_eq!(averages, vec![95.0, 90.0, 15.0]);
    assert_eq!(ranked[0]["name"], "Carl");
}

// == Redis Backend ==
// Runs only when REDIS_URL points at a disposable server; the cache flushes it.

#[tokio::test]
async fn test_redis_backend_when_available() {
    let Ok(url) = std::env::var("REDIS_URL") else {
        return;
    };

    let store = Arc::new(RedisStore::connect(&url).await.unwrap());
    let cache = InstrumentedCache::new(store.clone(), InstrumentationOptions::default())
        .await
        .unwrap();

    let key = cache.store("hello").await.unwrap();
    assert_eq!(
        cache.retrieve_as_string(&key).await.unwrap().as_deref(),
        Some("hello")
    );
    assert_eq!(cache.call_count(STORE_OP).await.unwrap(), 1);
    assert_eq!(cache.history(STORE_OP).await.unwrap().len(), 1);
    assert_eq!(cache.retrieve("missing").await.unwrap(), None);
}
