//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries from a memory store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that periodically removes expired entries.
///
/// Reads already treat expired entries as absent; the sweep only reclaims
/// memory held by keys nobody touches again.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(MemoryStore::new());
/// let cleanup_handle = spawn_cleanup_task(store.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;

            if removed > 0 {
                let stats = store.stats().await;
                info!(
                    "TTL cleanup: removed {} expired entries ({} live, hit rate {:.2})",
                    removed,
                    stats.total_entries,
                    stats.hit_rate()
                );
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
