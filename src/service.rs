//! Cache Service
//!
//! The facade every consumer talks to. Reads prefer the remote tier while it
//! is connected and fall through to the local fallback store otherwise;
//! writes go to the remote tier on a best-effort basis and are always
//! mirrored locally with the same TTL.
//!
//! No cache operation on this type returns an error. Backend failures become
//! misses or no-ops and are logged.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{hit_rate, LocalFallbackStore, ServiceStats, Tier, TierStats};
use crate::codec;
use crate::remote::{ConnectionState, RemoteTier};

// == Counters ==
#[derive(Debug, Default)]
struct Counters {
    remote_hits: AtomicU64,
    local_hits: AtomicU64,
    misses: AtomicU64,
    fallbacks: AtomicU64,
}

/// Outcome of [`CacheService::invalidate_prefix`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invalidation {
    /// Keys removed remotely, `None` when the remote tier was unreachable
    pub remote: Option<u64>,
    /// Entries removed from the local mirror
    pub local: usize,
}

// == Cache Service ==
/// Tiered cache facade. Construct once and share through `Arc`.
pub struct CacheService {
    remote: Option<Arc<dyn RemoteTier>>,
    local: Arc<LocalFallbackStore>,
    default_ttl: Duration,
    counters: Counters,
}

impl CacheService {
    // == Constructors ==
    /// Creates a facade over an optional remote tier and a local store.
    pub fn new(
        remote: Option<Arc<dyn RemoteTier>>,
        local: Arc<LocalFallbackStore>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            remote,
            local,
            default_ttl,
            counters: Counters::default(),
        }
    }

    /// Creates a facade that only ever uses the local store.
    pub fn local_only(max_entries: usize, default_ttl: Duration) -> Self {
        Self::new(None, Arc::new(LocalFallbackStore::new(max_entries)), default_ttl)
    }

    /// The local fallback store, shared with the sweep task.
    pub fn local(&self) -> &Arc<LocalFallbackStore> {
        &self.local
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// State of the remote tier, `None` in local-only mode.
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.remote.as_ref().map(|r| r.state())
    }

    pub fn is_connected(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.is_connected())
    }

    // == Get ==
    /// Returns the cached value for `key`, or `None` on a miss in both tiers.
    ///
    /// A value that fails to decode is treated as a miss for that tier.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(remote) = self.active_remote() {
            match remote.get(key).await {
                Ok(Some(bytes)) => match codec::decode(&bytes) {
                    Ok(value) => {
                        self.counters.remote_hits.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "cache hit (remote)");
                        return Some(value);
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "undecodable remote value, trying local tier");
                    }
                },
                Ok(None) => {
                    debug!(key = %key, "remote miss");
                }
                Err(e) => {
                    self.record_fallback();
                    warn!(key = %key, error = %e, "remote get failed, falling back to local tier");
                }
            }
        }

        self.get_local(key)
    }

    // == Set ==
    /// Stores `value` under `key` in both tiers.
    ///
    /// Uses the default TTL when `ttl` is `None`. Returns `true` when at least
    /// one tier accepted the value.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let bytes = match codec::encode(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "value not cacheable, skipping set");
                return false;
            }
        };

        let mut stored = false;
        if let Some(remote) = self.active_remote() {
            match remote.set(key, &bytes, ttl).await {
                Ok(()) => stored = true,
                Err(e) => {
                    self.record_fallback();
                    warn!(key = %key, error = %e, "remote set failed, keeping local copy only");
                }
            }
        }

        stored |= self.local.set(key, bytes, ttl);
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, stored, "cache set");
        stored
    }

    // == Get Or Set ==
    /// Read-through lookup.
    ///
    /// On a miss in both tiers `compute` runs once for this call and its
    /// result is stored in both tiers. Concurrent callers racing on the same
    /// cold key each run their own `compute`; it must be idempotent.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, compute: F, ttl: Option<Duration>) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.get(key).await {
            return value;
        }

        let value = compute().await;
        self.set(key, &value, ttl).await;
        value
    }

    /// Read-through lookup for fallible computations.
    ///
    /// An error from `compute` is returned unchanged and nothing is cached.
    pub async fn try_get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    // == Delete ==
    /// Removes `key` from both tiers. Returns `true` if either held it.
    pub async fn del(&self, key: &str) -> bool {
        let mut removed = false;
        if let Some(remote) = self.active_remote() {
            match remote.del(key).await {
                Ok(r) => removed = r,
                Err(e) => {
                    self.record_fallback();
                    warn!(key = %key, error = %e, "remote del failed");
                }
            }
        }

        self.local.delete(key) || removed
    }

    // == Exists ==
    /// Returns `true` if either tier holds a live entry for `key`.
    pub async fn exists(&self, key: &str) -> bool {
        if let Some(remote) = self.active_remote() {
            match remote.exists(key).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    self.record_fallback();
                    warn!(key = %key, error = %e, "remote exists failed");
                }
            }
        }

        self.local.contains(key)
    }

    // == Invalidate Prefix ==
    /// Removes every key starting with `prefix` from both tiers.
    pub async fn invalidate_prefix(&self, prefix: &str) -> Invalidation {
        let mut remote_removed = None;
        if let Some(remote) = self.active_remote() {
            match remote.delete_prefix(prefix).await {
                Ok(n) => remote_removed = Some(n),
                Err(e) => {
                    self.record_fallback();
                    warn!(prefix = %prefix, error = %e, "remote prefix delete failed");
                }
            }
        }

        let local = self.local.remove_prefix(prefix);
        debug!(prefix = %prefix, local, "prefix invalidated");

        Invalidation {
            remote: remote_removed,
            local,
        }
    }

    // == Stats ==
    /// Reports which tier is authoritative right now.
    pub fn stats(&self) -> TierStats {
        let connected = self.is_connected();
        TierStats {
            tier: if connected { Tier::Remote } else { Tier::Local },
            connected,
            entry_count: self.local.len(),
        }
    }

    /// Full statistics, including the remote key count when reachable.
    pub async fn detailed_stats(&self) -> ServiceStats {
        let summary = self.stats();
        let remote_keys = match self.remote.as_deref() {
            Some(remote) if summary.connected => remote.key_count().await.ok(),
            _ => None,
        };

        let remote_hits = self.counters.remote_hits.load(Ordering::Relaxed);
        let local_hits = self.counters.local_hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);

        ServiceStats {
            tier: summary.tier,
            connected: summary.connected,
            entry_count: summary.entry_count,
            remote_keys,
            remote_hits,
            local_hits,
            misses,
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
            local_evictions: self.local.stats().evictions,
            hit_rate: hit_rate(remote_hits + local_hits, misses),
        }
    }

    // == Internals ==
    /// The remote tier if it is connected. A configured but disconnected
    /// remote counts the operation as a fallback.
    fn active_remote(&self) -> Option<&dyn RemoteTier> {
        let remote = self.remote.as_deref()?;
        if remote.is_connected() {
            Some(remote)
        } else {
            self.record_fallback();
            None
        }
    }

    /// Counts an operation of any kind that skipped or failed the remote tier.
    fn record_fallback(&self) {
        self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    fn get_local<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(bytes) = self.local.get(key) else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "cache miss");
            return None;
        };

        match codec::decode(&bytes) {
            Ok(value) => {
                self.counters.local_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache hit (local)");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "undecodable local value, dropping entry");
                self.local.delete(key);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}
