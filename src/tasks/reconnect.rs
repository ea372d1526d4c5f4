//! Remote Reconnect Task
//!
//! Background task that restores the remote connection after a demotion.
//! Each round makes at most `max_retries` attempts with capped exponential
//! backoff, then idles for `reconnect_idle` before the next round.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::remote::{backoff_delay, RemoteCacheClient, RemoteTier};

/// Floor for the idle period so a misconfiguration cannot spin.
const MIN_IDLE: Duration = Duration::from_millis(100);

/// Spawns the reconnect loop for `client`.
///
/// While connected the task parks on the client's disconnect signal and
/// costs nothing.
pub fn spawn_reconnect_task(client: Arc<RemoteCacheClient>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let idle = client.config().reconnect_idle.max(MIN_IDLE);

        loop {
            if client.is_connected() {
                client.wait_for_disconnect().await;
                continue;
            }

            if reconnect_round(&client).await {
                info!("remote cache connection restored");
            } else {
                warn!(
                    idle_secs = idle.as_secs(),
                    "remote cache still unreachable, idling before next round"
                );
                tokio::time::sleep(idle).await;
            }
        }
    })
}

/// Runs one bounded round of connection attempts.
///
/// Returns true once an attempt succeeds.
pub async fn reconnect_round(client: &RemoteCacheClient) -> bool {
    let config = client.config();

    for attempt in 0..config.max_retries {
        match client.connect().await {
            Ok(()) => return true,
            Err(e) => {
                let delay = backoff_delay(attempt, config.retry_base, config.retry_max);
                debug!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "remote cache reconnect attempt failed"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use crate::remote::ConnectionState;
    use std::time::Instant;

    fn unreachable_client(max_retries: u32) -> RemoteCacheClient {
        let mut config = RemoteConfig::new("redis://127.0.0.1:1/0");
        config.connect_timeout = Duration::from_millis(100);
        config.max_retries = max_retries;
        config.retry_base = Duration::from_millis(10);
        config.retry_max = Duration::from_millis(40);
        config.reconnect_idle = Duration::from_millis(200);
        RemoteCacheClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_round_is_bounded() {
        let client = unreachable_client(3);

        let started = Instant::now();
        assert!(!reconnect_round(&client).await);

        // Three failed attempts sleep 10 + 20 + 40 ms.
        assert!(started.elapsed() >= Duration::from_millis(70));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_zero_retries_makes_no_attempt() {
        let client = unreachable_client(0);
        assert!(!reconnect_round(&client).await);
    }

    #[tokio::test]
    async fn test_task_keeps_client_disconnected_and_aborts() {
        let client = Arc::new(unreachable_client(2));
        let handle = spawn_reconnect_task(client.clone());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!client.is_connected());

        handle.abort();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }
}
