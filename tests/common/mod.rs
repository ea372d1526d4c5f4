//! Shared helpers for integration tests.
//!
//! `FakeRemote` is an in-process `RemoteTier` whose availability can be
//! toggled, so fallback behaviour is testable without a Redis server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use route_cache::cache::LocalFallbackStore;
use route_cache::error::{RemoteError, RemoteResult};
use route_cache::{CacheService, ConnectionState, RemoteTier};

// == Fake Remote ==
#[derive(Default)]
pub struct FakeRemote {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
    down: AtomicBool,
    /// Reports connected but fails every call with a timeout
    failing: AtomicBool,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulates the connection dropping (`false`) or coming back (`true`).
    pub fn set_up(&self, up: bool) {
        self.down.store(!up, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Whether a live entry exists, bypassing availability.
    pub fn holds(&self, key: &str) -> bool {
        self.entries
            .lock()
            .get(key)
            .is_some_and(|(_, expires)| *expires > Instant::now())
    }

    fn check(&self) -> RemoteResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable)
        } else if self.failing.load(Ordering::SeqCst) {
            Err(RemoteError::Timeout(Duration::from_millis(500)))
        } else {
            Ok(())
        }
    }

    fn live(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl RemoteTier for FakeRemote {
    fn state(&self) -> ConnectionState {
        if self.down.load(Ordering::SeqCst) {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }

    async fn get(&self, key: &str) -> RemoteResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.live(key))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> RemoteResult<()> {
        self.check()?;
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));
        Ok(())
    }

    async fn del(&self, key: &str) -> RemoteResult<bool> {
        self.check()?;
        let existed = self.live(key).is_some();
        self.entries.lock().remove(key);
        Ok(existed)
    }

    async fn exists(&self, key: &str) -> RemoteResult<bool> {
        self.check()?;
        Ok(self.live(key).is_some())
    }

    async fn incr(&self, key: &str, by: i64) -> RemoteResult<i64> {
        self.check()?;
        let mut entries = self.entries.lock();
        let (value, _) = entries
            .entry(key.to_string())
            .or_insert_with(|| (b"0".to_vec(), Instant::now() + Duration::from_secs(3600)));
        let next = std::str::from_utf8(value)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0)
            + by;
        *value = next.to_string().into_bytes();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> RemoteResult<bool> {
        self.check()?;
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some((_, expires)) => {
                *expires = Instant::now() + ttl;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> RemoteResult<u64> {
        self.check()?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn key_count(&self) -> RemoteResult<u64> {
        self.check()?;
        Ok(self.entries.lock().len() as u64)
    }
}

// == Builders ==
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Facade over a fresh fake remote and a local store of `max_entries`.
pub fn tiered_service(max_entries: usize) -> (Arc<CacheService>, Arc<FakeRemote>) {
    let remote = FakeRemote::new();
    let service = CacheService::new(
        Some(remote.clone() as Arc<dyn RemoteTier>),
        Arc::new(LocalFallbackStore::new(max_entries)),
        DEFAULT_TTL,
    );
    (Arc::new(service), remote)
}

pub fn local_service(max_entries: usize) -> Arc<CacheService> {
    Arc::new(CacheService::local_only(max_entries, DEFAULT_TTL))
}
