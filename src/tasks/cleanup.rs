//! Expired-Entry Sweep
//!
//! Background task that periodically removes expired local entries so that
//! cold reads never carry a backlog of deferred cleanup.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LocalFallbackStore;

/// Spawns a background task that purges expired entries every `interval`.
///
/// The lock on the store is held only for the purge itself, never across
/// the sleep.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(LocalFallbackStore::new(1000));
/// let sweep = spawn_cleanup_task(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<LocalFallbackStore>, interval: Duration) -> JoinHandle<()> {
    let interval = interval.max(Duration::from_millis(10));

    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting local cache sweep");

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.purge_expired();

            if removed > 0 {
                info!(removed, remaining = store.len(), "sweep removed expired entries");
            } else {
                debug!("sweep found no expired entries");
            }
        }
    })
}
