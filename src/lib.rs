//! Route Cache - a two-tier cache for a route-planning backend
//!
//! Reads and writes go to a Redis-compatible remote tier while it is
//! reachable and fall back to a bounded in-process store when it is not.
//! Domain helpers derive deterministic keys and TTLs for geocoding,
//! directions and static-asset lookups.

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod keyspace;
pub mod models;
pub mod policy;
pub mod remote;
pub mod runtime;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use keyspace::{CacheKeyspace, KeyArg};
pub use policy::{CacheDomain, Coordinates, RouteRequest, TieredPolicy};
pub use remote::{ConnectionState, RemoteCacheClient, RemoteTier};
pub use runtime::CacheRuntime;
pub use service::{CacheService, Invalidation};
pub use tasks::spawn_cleanup_task;
