//! Cache Statistics Module
//!
//! Tracks local store counters and the facade's tier introspection snapshots.

use serde::Serialize;

// == Cache Stats ==
/// Counters of the local fallback store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful local retrievals
    pub hits: u64,
    /// Number of failed local retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted under capacity pressure
    pub evictions: u64,
    /// Number of entries removed by lazy expiry or the sweep
    pub expirations: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.hits, self.misses)
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Tier ==
/// Which tier is currently authoritative for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Remote,
    Local,
}

// == Tier Stats ==
/// Cheap, synchronous snapshot returned by `CacheService::stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStats {
    pub tier: Tier,
    pub connected: bool,
    pub entry_count: usize,
}

// == Service Stats ==
/// Full snapshot returned by `CacheService::detailed_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    pub tier: Tier,
    pub connected: bool,
    /// Live entries in the local mirror
    pub entry_count: usize,
    /// Keys under this deployment's key prefix (the whole database when the
    /// prefix is empty), when the remote tier is reachable
    pub remote_keys: Option<u64>,
    pub remote_hits: u64,
    pub local_hits: u64,
    pub misses: u64,
    /// Operations of any kind (get, set, del, exists, invalidate) that
    /// skipped the remote tier or failed against it
    pub fallbacks: u64,
    pub local_evictions: u64,
    pub hit_rate: f64,
}

/// Shared hit-rate arithmetic.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
