//! Instrumented Cache Module
//!
//! Stores scalar payloads under generated keys, with optional call counting
//! and call history around `store`.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::instrument::{Instrumentation, InstrumentationOptions, InvocationRecord};
use crate::cache::value::{decode_float, decode_int, decode_utf8, StoredValue};
use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;

/// Operation identifier under which `store` calls are counted and recorded.
pub const STORE_OP: &str = "Cache.store";

// == Instrumented Cache ==
/// Facade over a key-value store for one fresh session.
#[derive(Clone)]
pub struct InstrumentedCache {
    store: Arc<dyn KeyValueStore>,
    instrumentation: Instrumentation,
}

impl InstrumentedCache {
    // == Constructor ==
    /// Flushes every key in `store` and returns a cache over it.
    pub async fn new(
        store: Arc<dyn KeyValueStore>,
        options: InstrumentationOptions,
    ) -> Result<Self> {
        store.flush_all().await?;
        info!(
            "Cache initialized: count_calls={}, call_history={}",
            options.count_calls, options.call_history
        );
        Ok(Self {
            instrumentation: Instrumentation::new(store.clone(), options),
            store,
        })
    }

    // == Store ==
    /// Writes `value` under a fresh UUID v4 key and returns the key.
    pub async fn store(&self, value: impl Into<StoredValue>) -> Result<String> {
        let value = value.into();
        let args = format!("({},)", value);
        let store = &self.store;
        let payload = value.to_bytes();
        let payload = payload.as_slice();

        self.instrumentation
            .call(STORE_OP, args, || async move {
                let key = Uuid::new_v4().to_string();
                store.set(&key, payload).await?;
                debug!("Stored value under {}", key);
                Ok::<_, CacheError>(key)
            })
            .await
    }

    // == Retrieve ==
    /// Returns the raw bytes under `key`, or `None` when absent.
    pub async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key).await
    }

    /// Returns the value under `key` passed through `decode`.
    ///
    /// The caller picks a decoder matching the type originally stored.
    pub async fn retrieve_with<T, F>(&self, key: &str, decode: F) -> Result<Option<T>>
    where
        F: FnOnce(Vec<u8>) -> Result<T>,
    {
        self.retrieve(key).await?.map(decode).transpose()
    }

    pub async fn retrieve_as_string(&self, key: &str) -> Result<Option<String>> {
        self.retrieve_with(key, decode_utf8).await
    }

    pub async fn retrieve_as_integer(&self, key: &str) -> Result<Option<i64>> {
        self.retrieve_with(key, decode_int).await
    }

    pub async fn retrieve_as_float(&self, key: &str) -> Result<Option<f64>> {
        self.retrieve_with(key, decode_float).await
    }

    // == Instrumentation Views ==
    /// Number of recorded calls to `op` (e.g. [`STORE_OP`]).
    pub async fn call_count(&self, op: &str) -> Result<u64> {
        self.instrumentation.call_count(op).await
    }

    pub async fn history(&self, op: &str) -> Result<Vec<InvocationRecord>> {
        self.instrumentation.history(op).await
    }

    /// Renders and logs the call history of `op`.
    pub async fn replay(&self, op: &str) -> Result<Vec<String>> {
        self.instrumentation.replay(op).await
    }
}

impl std::fmt::Debug for InstrumentedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedCache")
            .field("instrumentation", &self.instrumentation)
            .finish_non_exhaustive()
    }
}
