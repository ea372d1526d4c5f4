//! Cache Runtime
//!
//! Wires the cache together from configuration: builds the remote client when
//! a target is configured, makes one initial connection attempt, and starts
//! the background tasks. The resulting `Arc<CacheService>` is what the rest of
//! the application receives.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::LocalFallbackStore;
use crate::config::Config;
use crate::policy::TieredPolicy;
use crate::remote::{RemoteCacheClient, RemoteTier};
use crate::service::CacheService;
use crate::tasks::{spawn_cleanup_task, spawn_reconnect_task};

/// A started cache and the handles of its background tasks.
pub struct CacheRuntime {
    pub service: Arc<CacheService>,
    pub policy: TieredPolicy,
    tasks: Vec<JoinHandle<()>>,
}

impl CacheRuntime {
    /// Builds and starts the cache described by `config`.
    ///
    /// Never fails: an unusable remote target or an unreachable backend
    /// leaves the cache serving from the local tier.
    pub async fn start(config: &Config) -> Self {
        let local = Arc::new(LocalFallbackStore::new(config.max_local_entries));
        let mut tasks = vec![spawn_cleanup_task(local.clone(), config.cleanup_interval)];

        let remote = match &config.remote {
            Some(remote_config) => match RemoteCacheClient::new(remote_config.clone()) {
                Ok(client) => {
                    let client = Arc::new(client);
                    if let Err(e) = client.connect().await {
                        warn!(error = %e, "remote cache unreachable at startup, using local tier");
                    }
                    tasks.push(spawn_reconnect_task(client.clone()));
                    Some(client as Arc<dyn RemoteTier>)
                }
                Err(e) => {
                    warn!(error = %e, "remote cache disabled");
                    None
                }
            },
            None => {
                info!("no remote cache configured, running local-only");
                None
            }
        };

        let service = Arc::new(CacheService::new(remote, local, config.default_ttl));
        let policy = TieredPolicy::from_config(service.clone(), config);

        Self {
            service,
            policy,
            tasks,
        }
    }

    /// Stops the background tasks.
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Tier;
    use crate::config::RemoteConfig;
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_local_only() {
        let runtime = CacheRuntime::start(&Config::default()).await;

        assert_eq!(runtime.service.connection_state(), None);
        assert!(runtime.service.set("k", &1u8, None).await);
        assert_eq!(runtime.service.stats().tier, Tier::Local);

        runtime.shutdown();
    }

    #[tokio::test]
    async fn test_start_with_unreachable_remote_degrades() {
        let mut remote = RemoteConfig::new("redis://127.0.0.1:1/0");
        remote.connect_timeout = Duration::from_millis(100);
        let config = Config {
            remote: Some(remote),
            ..Config::default()
        };

        let runtime = CacheRuntime::start(&config).await;

        assert!(runtime.service.connection_state().is_some());
        assert!(!runtime.service.is_connected());
        assert!(runtime.service.set("k", &"v", None).await);
        assert_eq!(runtime.service.get::<String>("k").await.as_deref(), Some("v"));

        runtime.shutdown();
    }

    #[tokio::test]
    async fn test_start_with_invalid_target_runs_local_only() {
        let config = Config {
            remote: Some(RemoteConfig::new("definitely not a url")),
            ..Config::default()
        };

        let runtime = CacheRuntime::start(&config).await;
        assert_eq!(runtime.service.connection_state(), None);
        runtime.shutdown();
    }
}
