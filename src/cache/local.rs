//! Local Fallback Store
//!
//! Thread-safe wrapper around [`LocalStore`] shared by the facade and the
//! background sweep. Every operation holds the lock only for a map update, so
//! the local path never awaits.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheStats, LocalStore};

/// Bounded, ephemeral, in-process tier.
#[derive(Debug)]
pub struct LocalFallbackStore {
    inner: Mutex<LocalStore>,
}

impl LocalFallbackStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(LocalStore::new(max_entries)),
        }
    }

    /// Returns the live value for `key`, expiring it lazily if needed.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().get(key)
    }

    /// Stores `value` for `ttl`. Capacity pressure is resolved by eviction;
    /// the only failure left is a rejected value, reported as `false`.
    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> bool {
        match self.inner.lock().set(key.to_string(), value, ttl) {
            Ok(Some(evicted)) => {
                debug!(key = %key, evicted = %evicted, "local store full, evicted oldest entry");
                true
            }
            Ok(None) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "local store rejected entry");
                false
            }
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn remove_prefix(&self, prefix: &str) -> usize {
        self.inner.lock().remove_prefix(prefix)
    }

    /// Proactively drops expired entries; called by the sweep task.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_get_delete() {
        let store = LocalFallbackStore::new(10);

        assert!(store.set("a", b"1".to_vec(), Duration::from_secs(60)));
        assert_eq!(store.get("a"), Some(b"1".to_vec()));
        assert!(store.contains("a"));
        assert!(store.delete("a"));
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_bounded_eviction_keeps_capacity() {
        let store = LocalFallbackStore::new(5);

        for i in 0..6 {
            store.set(&format!("key{}", i), vec![i as u8], Duration::from_secs(60));
        }

        assert_eq!(store.len(), 5);
        assert_eq!(store.get("key0"), None);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_concurrent_writers_respect_bound() {
        let store = Arc::new(LocalFallbackStore::new(50));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.set(&format!("t{}-{}", t, i), vec![0], Duration::from_secs(60));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_rejected_value_reports_false() {
        let store = LocalFallbackStore::new(0);
        assert!(!store.set("a", b"1".to_vec(), Duration::from_secs(60)));
    }
}
