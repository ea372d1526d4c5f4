//! Remote cache client for a Redis-compatible backend
//!
//! Owns the connection state machine:
//!
//! ```text
//! Disconnected --connect()--> Connecting --ok--> Connected
//!                                  |                 |
//!                                  +--err------------+--I/O error / timeout--> Disconnected
//! ```
//!
//! Reconnection is driven by `tasks::spawn_reconnect_task`, which waits on
//! [`RemoteCacheClient::wait_for_disconnect`].

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisResult};
use tokio::sync::Notify;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::remote::{ConnectionState, RemoteTier};

/// Keys fetched per SCAN round trip during prefix deletes.
const SCAN_BATCH: usize = 100;

/// Client for the remote tier.
pub struct RemoteCacheClient {
    client: Client,
    config: RemoteConfig,
    state: AtomicU8,
    connection: RwLock<Option<MultiplexedConnection>>,
    disconnected: Notify,
}

impl RemoteCacheClient {
    /// Creates a client for the configured target without connecting.
    ///
    /// Fails only when the target URL cannot be parsed.
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RemoteError::InvalidTarget(e.to_string()))?;

        Ok(Self {
            client,
            config,
            state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            connection: RwLock::new(None),
            disconnected: Notify::new(),
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    // == Connect ==
    /// Attempts one connection, bounded by the connect timeout.
    pub async fn connect(&self) -> RemoteResult<()> {
        self.set_state(ConnectionState::Connecting);

        let attempt = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, RemoteError>(conn)
        };

        match timeout(self.config.connect_timeout, attempt).await {
            Ok(Ok(conn)) => {
                *self.connection.write() = Some(conn);
                self.set_state(ConnectionState::Connected);
                info!(target_url = %redacted(&self.config.url), "remote cache connected");
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                debug!(error = %e, "remote cache connect failed");
                Err(e)
            }
            Err(_) => {
                self.set_state(ConnectionState::Disconnected);
                debug!("remote cache connect timed out");
                Err(RemoteError::Timeout(self.config.connect_timeout))
            }
        }
    }

    /// Drops the connection and moves to `Disconnected`.
    ///
    /// Wakes the reconnect task if the client was connected.
    pub fn mark_disconnected(&self, reason: &RemoteError) {
        let previous = self.swap_state(ConnectionState::Disconnected);
        *self.connection.write() = None;

        if previous == ConnectionState::Connected {
            warn!(error = %reason, "remote cache disconnected, serving from local tier");
            self.disconnected.notify_one();
        }
    }

    /// Resolves once the client has been demoted from `Connected`.
    pub async fn wait_for_disconnect(&self) {
        self.disconnected.notified().await;
    }

    /// Round-trips a PING on the live connection.
    pub async fn ping(&self) -> RemoteResult<()> {
        let _: String = self
            .run("PING", |mut conn| async move {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;
        Ok(())
    }

    // == Internals ==
    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    fn swap_state(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u8(self.state.swap(state.as_u8(), Ordering::SeqCst))
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    fn live_connection(&self) -> Option<MultiplexedConnection> {
        if self.state() != ConnectionState::Connected {
            return None;
        }
        self.connection.read().clone()
    }

    /// Runs one command on a clone of the live connection.
    ///
    /// Fails fast when not connected. Timeouts and transport errors demote
    /// the client; the error is returned to the caller as a value.
    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> RemoteResult<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let conn = self.live_connection().ok_or(RemoteError::Unavailable)?;

        match timeout(self.config.command_timeout, f(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let err = RemoteError::Command(e);
                if err.is_connection_failure() {
                    self.mark_disconnected(&err);
                } else {
                    debug!(op, error = %err, "remote cache command rejected");
                }
                Err(err)
            }
            Err(_) => {
                let err = RemoteError::Timeout(self.config.command_timeout);
                debug!(op, "remote cache command timed out");
                self.mark_disconnected(&err);
                Err(err)
            }
        }
    }
}

#[async_trait]
impl RemoteTier for RemoteCacheClient {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    async fn get(&self, key: &str) -> RemoteResult<Option<Vec<u8>>> {
        let full = self.full_key(key);
        self.run("GET", |mut conn| async move { conn.get(&full).await })
            .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> RemoteResult<()> {
        let full = self.full_key(key);
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        self.run("SET", |mut conn| async move {
            redis::cmd("SET")
                .arg(&full)
                .arg(value)
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn del(&self, key: &str) -> RemoteResult<bool> {
        let full = self.full_key(key);
        let removed: i64 = self
            .run("DEL", |mut conn| async move { conn.del(&full).await })
            .await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> RemoteResult<bool> {
        let full = self.full_key(key);
        self.run("EXISTS", |mut conn| async move { conn.exists(&full).await })
            .await
    }

    async fn incr(&self, key: &str, by: i64) -> RemoteResult<i64> {
        let full = self.full_key(key);
        self.run("INCR", |mut conn| async move { conn.incr(&full, by).await })
            .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> RemoteResult<bool> {
        let full = self.full_key(key);
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        self.run("PEXPIRE", |mut conn| async move {
            redis::cmd("PEXPIRE")
                .arg(&full)
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn delete_prefix(&self, prefix: &str) -> RemoteResult<u64> {
        let pattern = format!("{}*", escape_glob(&self.full_key(prefix)));
        let mut cursor: u64 = 0;
        let mut total_deleted: u64 = 0;

        loop {
            let (next, keys) = self.scan_page(&pattern, cursor).await?;

            if !keys.is_empty() {
                let deleted: i64 = self
                    .run("DEL", |mut conn| async move { conn.del(&keys).await })
                    .await?;
                total_deleted += deleted.max(0) as u64;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }

    /// Keys under this client's prefix. Without a prefix the whole database
    /// is counted with DBSIZE.
    async fn key_count(&self) -> RemoteResult<u64> {
        if self.config.key_prefix.is_empty() {
            return self
                .run("DBSIZE", |mut conn| async move {
                    redis::cmd("DBSIZE").query_async(&mut conn).await
                })
                .await;
        }

        let pattern = format!("{}*", escape_glob(&self.config.key_prefix));
        let mut cursor: u64 = 0;
        let mut total: u64 = 0;

        loop {
            let (next, keys) = self.scan_page(&pattern, cursor).await?;
            total += keys.len() as u64;

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(total)
    }
}

impl RemoteCacheClient {
    /// One SCAN round trip for `pattern` starting at `cursor`.
    async fn scan_page(&self, pattern: &str, cursor: u64) -> RemoteResult<(u64, Vec<String>)> {
        let pattern = pattern.to_string();
        self.run("SCAN", |mut conn| async move {
            redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
        })
        .await
    }
}

/// Escapes glob metacharacters so a prefix matches literally in SCAN MATCH.
fn escape_glob(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Hides the password part of a connection URL for logging.
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
