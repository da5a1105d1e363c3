//! Key-Value Store Module
//!
//! The store interface consumed by the caches, with an in-memory backend and a
//! Redis backend.

mod entry;
mod memory;
mod redis_store;
mod stats;

// Re-export public types
pub use entry::{current_timestamp_ms, EntryValue, StoreEntry};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use stats::StoreStats;

use async_trait::async_trait;

use crate::error::Result;

// == Key-Value Store ==
/// Operations the caches need from a key-value backend.
///
/// Each call is atomic on its own; sequences of calls are not.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Returns the bytes under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key` for `ttl_seconds`.
    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<()>;

    /// Increments the integer counter under `key` (missing counts as 0), returning the new value.
    async fn increment(&self, key: &str) -> Result<i64>;

    /// Appends `value` to the list under `key`, returning the new list length.
    async fn append_to_list(&self, key: &str, value: &[u8]) -> Result<usize>;

    /// Returns every element of the list under `key`; empty when absent.
    async fn list_range(&self, key: &str) -> Result<Vec<Vec<u8>>>;

    /// Removes every key.
    async fn flush_all(&self) -> Result<()>;
}
