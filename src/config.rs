//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Connection and retry settings for the remote tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    /// Connection URL (`redis://[:password@]host:port/db`)
    pub url: String,
    /// Prefix prepended to every remote key, per deployment/tenant
    pub key_prefix: String,
    /// Upper bound for establishing a connection
    pub connect_timeout: Duration,
    /// Upper bound for any single command round trip
    pub command_timeout: Duration,
    /// Reconnect attempts per round before idling
    pub max_retries: u32,
    /// First backoff delay; doubled on each attempt
    pub retry_base: Duration,
    /// Backoff ceiling
    pub retry_max: Duration,
    /// Idle time between exhausted retry rounds
    pub reconnect_idle: Duration,
}

impl RemoteConfig {
    /// Creates remote settings for `url` with default timeouts and backoff.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            connect_timeout: Duration::from_millis(2000),
            command_timeout: Duration::from_millis(500),
            max_retries: 5,
            retry_base: Duration::from_millis(100),
            retry_max: Duration::from_millis(3000),
            reconnect_idle: Duration::from_secs(30),
        }
    }
}

/// Default TTLs for each cache domain, before the development multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainTtls {
    pub geocode: Duration,
    pub directions: Duration,
    pub static_asset: Duration,
}

impl Default for DomainTtls {
    fn default() -> Self {
        Self {
            geocode: Duration::from_secs(7 * 24 * 60 * 60),
            directions: Duration::from_secs(60 * 60),
            static_asset: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote tier settings; `None` runs the cache in local-only mode
    pub remote: Option<RemoteConfig>,
    /// Maximum number of entries the local fallback store can hold
    pub max_local_entries: usize,
    /// TTL applied when a caller passes none
    pub default_ttl: Duration,
    /// Interval between expired-entry sweeps of the local store
    pub cleanup_interval: Duration,
    /// Per-domain TTLs
    pub domain_ttls: DomainTtls,
    /// Development mode scales every domain TTL by `dev_ttl_multiplier`
    pub development: bool,
    /// TTL multiplier applied in development mode
    pub dev_ttl_multiplier: u32,
    /// Enables the response-cache middleware on the admin server
    pub cache_responses: bool,
    /// HTTP port of the admin server
    pub server_port: u16,
}

/// Default deployment prefix for remote keys.
pub const DEFAULT_KEY_PREFIX: &str = "route-planner:";

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Remote connection URL (takes precedence over host/port)
    /// - `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`, `REDIS_DB` - Alternate target
    /// - `CACHE_KEY_PREFIX` - Remote key prefix (default: "route-planner:")
    /// - `CACHE_MAX_LOCAL_ENTRIES` - Local fallback bound (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep interval in seconds (default: 60)
    /// - `CACHE_TTL_GEOCODE`, `CACHE_TTL_DIRECTIONS`, `CACHE_TTL_STATIC_ASSET` - Domain TTLs in seconds
    /// - `APP_ENV` - "development" enables the TTL multiplier (default: production)
    /// - `CACHE_DEV_TTL_MULTIPLIER` - Multiplier in development (default: 10)
    /// - `REDIS_CONNECT_TIMEOUT_MS`, `REDIS_COMMAND_TIMEOUT_MS` - Timeouts
    /// - `REDIS_MAX_RETRIES`, `REDIS_RETRY_BASE_MS`, `REDIS_RETRY_MAX_MS` - Backoff
    /// - `REDIS_RECONNECT_IDLE` - Idle seconds between retry rounds (default: 30)
    /// - `CACHE_RESPONSES` - Response-cache middleware (default: on in development)
    /// - `SERVER_PORT` - Admin server port (default: 3000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let development = parse("APP_ENV")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "development" | "dev"))
            .unwrap_or(false);

        let remote = remote_target(&parse).map(|url| {
            let base = RemoteConfig::new(url);
            RemoteConfig {
                key_prefix: parse("CACHE_KEY_PREFIX").unwrap_or(base.key_prefix),
                connect_timeout: millis_or(&parse, "REDIS_CONNECT_TIMEOUT_MS", base.connect_timeout),
                command_timeout: millis_or(&parse, "REDIS_COMMAND_TIMEOUT_MS", base.command_timeout),
                max_retries: value_or(&parse, "REDIS_MAX_RETRIES", base.max_retries),
                retry_base: millis_or(&parse, "REDIS_RETRY_BASE_MS", base.retry_base),
                retry_max: millis_or(&parse, "REDIS_RETRY_MAX_MS", base.retry_max),
                reconnect_idle: secs_or(&parse, "REDIS_RECONNECT_IDLE", base.reconnect_idle),
                url: base.url,
            }
        });

        Self {
            remote,
            max_local_entries: value_or(&parse, "CACHE_MAX_LOCAL_ENTRIES", defaults.max_local_entries),
            default_ttl: secs_or(&parse, "CACHE_DEFAULT_TTL", defaults.default_ttl),
            cleanup_interval: secs_or(&parse, "CACHE_CLEANUP_INTERVAL", defaults.cleanup_interval),
            domain_ttls: DomainTtls {
                geocode: secs_or(&parse, "CACHE_TTL_GEOCODE", defaults.domain_ttls.geocode),
                directions: secs_or(&parse, "CACHE_TTL_DIRECTIONS", defaults.domain_ttls.directions),
                static_asset: secs_or(&parse, "CACHE_TTL_STATIC_ASSET", defaults.domain_ttls.static_asset),
            },
            development,
            dev_ttl_multiplier: value_or(&parse, "CACHE_DEV_TTL_MULTIPLIER", defaults.dev_ttl_multiplier),
            cache_responses: parse("CACHE_RESPONSES")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(development),
            server_port: value_or(&parse, "SERVER_PORT", defaults.server_port),
        }
    }

    /// Multiplier applied to every domain TTL (1 outside development).
    pub fn ttl_multiplier(&self) -> u32 {
        if self.development {
            self.dev_ttl_multiplier.max(1)
        } else {
            1
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: None,
            max_local_entries: 1000,
            default_ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
            domain_ttls: DomainTtls::default(),
            development: false,
            dev_ttl_multiplier: 10,
            cache_responses: false,
            server_port: 3000,
        }
    }
}

// == Helpers ==
fn remote_target(parse: &impl Fn(&str) -> Option<String>) -> Option<String> {
    if let Some(url) = parse("REDIS_URL") {
        return Some(url);
    }

    let host = parse("REDIS_HOST")?;
    let port: u16 = value_or(parse, "REDIS_PORT", 6379);
    let db: u32 = value_or(parse, "REDIS_DB", 0);
    let auth = match parse("REDIS_PASSWORD") {
        Some(pwd) => format!(":{}@", urlencoding::encode(&pwd)),
        None => String::new(),
    };

    Some(format!("redis://{}{}:{}/{}", auth, host, port, db))
}

fn value_or<T: FromStr>(parse: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    parse(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn secs_or(parse: &impl Fn(&str) -> Option<String>, name: &str, default: Duration) -> Duration {
    parse(name)
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn millis_or(parse: &impl Fn(&str) -> Option<String>, name: &str, default: Duration) -> Duration {
    parse(name)
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.remote.is_none());
        assert_eq!(config.max_local_entries, 1000);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.ttl_multiplier(), 1);
    }

    #[test]
    fn test_config_from_empty_lookup_matches_defaults() {
        let config = config_from(&[]);
        assert!(config.remote.is_none());
        assert_eq!(config.max_local_entries, 1000);
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert_eq!(config.domain_ttls, DomainTtls::default());
        assert!(!config.cache_responses);
    }

    #[test]
    fn test_redis_url_takes_precedence() {
        let config = config_from(&[
            ("REDIS_URL", "redis://cache.internal:6380/2"),
            ("REDIS_HOST", "ignored"),
        ]);
        let remote = config.remote.unwrap();
        assert_eq!(remote.url, "redis://cache.internal:6380/2");
        assert_eq!(remote.key_prefix, DEFAULT_KEY_PREFIX);
    }

    #[test]
    fn test_host_port_password_target() {
        let config = config_from(&[
            ("REDIS_HOST", "10.0.0.5"),
            ("REDIS_PORT", "6390"),
            ("REDIS_PASSWORD", "s3cret"),
            ("CACHE_KEY_PREFIX", "tenant-a:"),
            ("REDIS_COMMAND_TIMEOUT_MS", "250"),
        ]);
        let remote = config.remote.unwrap();
        assert_eq!(remote.url, "redis://:s3cret@10.0.0.5:6390/0");
        assert_eq!(remote.key_prefix, "tenant-a:");
        assert_eq!(remote.command_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_password_with_url_metacharacters_is_encoded() {
        let config = config_from(&[
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PASSWORD", "p@ss/w:rd"),
        ]);
        let remote = config.remote.unwrap();
        assert_eq!(remote.url, "redis://:p%40ss%2Fw%3Ard@cache.internal:6379/0");
        assert!(crate::remote::RemoteCacheClient::new(remote).is_ok());
    }

    #[test]
    fn test_development_mode_multiplier() {
        let config = config_from(&[("APP_ENV", "development")]);
        assert!(config.development);
        assert_eq!(config.ttl_multiplier(), 10);
        assert!(config.cache_responses);

        let config = config_from(&[("APP_ENV", "development"), ("CACHE_DEV_TTL_MULTIPLIER", "3")]);
        assert_eq!(config.ttl_multiplier(), 3);

        let config = config_from(&[("APP_ENV", "production"), ("CACHE_DEV_TTL_MULTIPLIER", "3")]);
        assert_eq!(config.ttl_multiplier(), 1);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config_from(&[
            ("CACHE_MAX_LOCAL_ENTRIES", "lots"),
            ("CACHE_TTL_GEOCODE", "-1"),
            ("CACHE_RESPONSES", "maybe"),
        ]);
        assert_eq!(config.max_local_entries, 1000);
        assert_eq!(config.domain_ttls.geocode, DomainTtls::default().geocode);
        assert!(!config.cache_responses);
    }
}
