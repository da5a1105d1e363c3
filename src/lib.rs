//! KV Exercises - an instrumented key-value cache, an expiring page cache and
//! document collection helpers.
//!
//! Stores are injected as `Arc<dyn KeyValueStore>`; use [`store::MemoryStore`]
//! in-process or [`store::RedisStore`] against a Redis server.

pub mod cache;
pub mod config;
pub mod documents;
pub mod error;
pub mod store;
pub mod tasks;
pub mod web;

pub use cache::{InstrumentationOptions, InstrumentedCache, StoredValue};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
pub use tasks::spawn_cleanup_task;
pub use web::{ExpiringPageCache, HttpFetcher, PageFetcher};
