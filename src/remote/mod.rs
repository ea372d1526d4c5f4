//! Remote Tier Module
//!
//! Connection-managed client for a Redis-compatible backend and the trait
//! seam the facade uses to reach it.

mod backoff;
mod client;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RemoteResult;

pub use backoff::backoff_delay;
pub use client::RemoteCacheClient;

// == Connection State ==
/// Lifecycle of the remote connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            2 => ConnectionState::Connected,
            1 => ConnectionState::Connecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

// == Remote Tier ==
/// Operations the facade needs from a remote backend.
///
/// Implementations return `RemoteError::Unavailable` without doing I/O when
/// not connected, bound every call by a timeout, and never panic on
/// transport failures. Keys passed in are logical keys; any deployment prefix
/// is the implementation's concern.
#[async_trait]
pub trait RemoteTier: Send + Sync {
    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    async fn get(&self, key: &str) -> RemoteResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> RemoteResult<()>;

    async fn del(&self, key: &str) -> RemoteResult<bool>;

    async fn exists(&self, key: &str) -> RemoteResult<bool>;

    async fn incr(&self, key: &str, by: i64) -> RemoteResult<i64>;

    async fn expire(&self, key: &str, ttl: Duration) -> RemoteResult<bool>;

    /// Deletes every key starting with `prefix`, returning the count removed.
    async fn delete_prefix(&self, prefix: &str) -> RemoteResult<u64>;

    /// Number of keys held by the backend.
    async fn key_count(&self) -> RemoteResult<u64>;
}
