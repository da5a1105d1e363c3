//! Memory Store Module
//!
//! In-process key-value backend: HashMap storage with lazy TTL expiration.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::store::{EntryValue, KeyValueStore, StoreEntry, StoreStats};

#[derive(Debug, Default)]
struct Inner {
    /// Key-value storage
    entries: HashMap<String, StoreEntry>,
    /// Read statistics
    stats: StoreStats,
}

impl Inner {
    /// Returns the live entry under `key`, dropping it first if it has expired.
    fn live_entry(&mut self, key: &str) -> Option<&mut StoreEntry> {
        if self.entries.get(key).is_some_and(StoreEntry::is_expired) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }
}

// == Memory Store ==
/// In-memory store with TTL support.
///
/// Every operation takes the lock once, so single operations are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Stats ==
    /// Returns current read statistics.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - inner.entries.len();
        let remaining = inner.entries.len();
        inner.stats.set_total_entries(remaining);
        removed
    }

    // == Length ==
    /// Returns the number of entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    async fn put(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>) {
        let entry = StoreEntry::new(EntryValue::Bytes(value.to_vec()), ttl_seconds);
        let mut inner = self.inner.write().await;
        inner.entries.insert(key.to_string(), entry);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.put(key, value, None).await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut inner = self.inner.write().await;
        let value = match inner.live_entry(key) {
            Some(StoreEntry {
                value: EntryValue::Bytes(bytes),
                ..
            }) => Some(bytes.clone()),
            Some(_) => {
                return Err(CacheError::WrongType(format!("{} holds a list", key)));
            }
            None => None,
        };

        if value.is_some() {
            inner.stats.record_hit();
        } else {
            inner.stats.record_miss();
        }
        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Err(CacheError::Store(format!(
                "invalid expire time for {}",
                key
            )));
        }
        self.put(key, value, Some(ttl_seconds)).await;
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut inner = self.inner.write().await;
        let next = match inner.live_entry(key) {
            Some(entry) => {
                let current = match &entry.value {
                    EntryValue::Bytes(bytes) => std::str::from_utf8(bytes)
                        .ok()
                        .and_then(|s| s.parse::<i64>().ok())
                        .ok_or_else(|| {
                            CacheError::WrongType(format!("{} is not an integer", key))
                        })?,
                    EntryValue::List(_) => {
                        return Err(CacheError::WrongType(format!("{} holds a list", key)));
                    }
                };
                let next = current.checked_add(1).ok_or_else(|| {
                    CacheError::WrongType(format!("{} would overflow", key))
                })?;
                // Keeps the existing expiry
                entry.value = EntryValue::Bytes(next.to_string().into_bytes());
                next
            }
            None => {
                inner.entries.insert(
                    key.to_string(),
                    StoreEntry::new(EntryValue::Bytes(b"1".to_vec()), None),
                );
                1
            }
        };
        debug!("INCR {} -> {}", key, next);
        Ok(next)
    }

    async fn append_to_list(&self, key: &str, value: &[u8]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        match inner.live_entry(key) {
            Some(StoreEntry {
                value: EntryValue::List(items),
                ..
            }) => {
                items.push(value.to_vec());
                Ok(items.len())
            }
            Some(_) => Err(CacheError::WrongType(format!("{} is not a list", key))),
            None => {
                inner.entries.insert(
                    key.to_string(),
                    StoreEntry::new(EntryValue::List(vec![value.to_vec()]), None),
                );
                Ok(1)
            }
        }
    }

    async fn list_range(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let mut inner = self.inner.write().await;
        match inner.live_entry(key) {
            Some(StoreEntry {
                value: EntryValue::List(items),
                ..
            }) => Ok(items.clone()),
            Some(_) => Err(CacheError::WrongType(format!("{} is not a list", key))),
            None => Ok(Vec::new()),
        }
    }

    async fn flush_all(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.stats.set_total_entries(0);
        debug!("FLUSH removed {} entries", removed);
        Ok(())
    }
}
