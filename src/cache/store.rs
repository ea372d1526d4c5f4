//! Local Store Module
//!
//! Single-threaded cache engine combining HashMap storage with FIFO eviction
//! and TTL expiration. Shared access goes through [`super::LocalFallbackStore`].

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, FifoOrder, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Local Store ==
/// Bounded key-value storage with FIFO eviction and TTL support.
#[derive(Debug)]
pub struct LocalStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Insertion order for eviction
    order: FifoOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl LocalStore {
    // == Constructor ==
    /// Creates a new store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: FifoOrder::new(),
            stats: CacheStats::new(),
            max_entries,
        }
    }

    // == Set ==
    /// Stores a value under `key` for `ttl`.
    ///
    /// Overwriting a key replaces the entry and counts as a fresh insertion.
    /// When a new key arrives at capacity, the oldest insertion is evicted
    /// first and its key returned.
    pub fn set(&mut self, key: String, value: Vec<u8>, ttl: Duration) -> Result<Option<String>> {
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let is_overwrite = self.entries.contains_key(&key);
        let mut evicted = None;

        if !is_overwrite && self.entries.len() >= self.max_entries {
            match self.order.pop_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    self.stats.record_eviction();
                    evicted = Some(oldest);
                }
                None => {
                    return Err(CacheError::Capacity(format!(
                        "local store holds at most {} entries",
                        self.max_entries
                    )));
                }
            }
        }

        let entry = CacheEntry::new(key.clone(), value, ttl);
        self.order.record_insert(&key);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());

        Ok(evicted)
    }

    // == Get ==
    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed on the spot and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        if self.evict_if_expired(key) {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Contains ==
    /// Returns true if `key` holds a live entry. Does not touch hit counters.
    pub fn contains(&mut self, key: &str) -> bool {
        !self.evict_if_expired(key) && self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry by key, returning whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Remove Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(prefix));
        self.order.retain(|k| !k.starts_with(prefix));
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Oldest live insertion, i.e. the next eviction candidate.
    pub fn oldest_key(&self) -> Option<&str> {
        self.order.peek_oldest()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn evict_if_expired(&mut self, key: &str) -> bool {
        let expired = self.entries.get(key).is_some_and(CacheEntry::is_expired);
        if expired {
            self.entries.remove(key);
            self.order.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        expired
    }
}
