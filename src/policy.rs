//! Tiered Policy
//!
//! Domain-specific helpers over [`CacheService`]. Each domain carries its own
//! TTL and normalises its inputs before building a key, so callers asking for
//! "Austin, TX" and "austin tx" share a slot.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::{Config, DomainTtls};
use crate::keyspace::{CacheKeyspace, KeyArg};
use crate::service::{CacheService, Invalidation};

// == Cache Domain ==
/// Logical namespace with its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheDomain {
    /// Forward and reverse geocoding results; change almost never
    Geocode,
    /// Route computations; traffic and closures make them volatile
    Directions,
    /// Resolved static asset URLs (place photos, map tiles)
    StaticAsset,
}

impl CacheDomain {
    pub const ALL: [CacheDomain; 3] = [
        CacheDomain::Geocode,
        CacheDomain::Directions,
        CacheDomain::StaticAsset,
    ];

    /// Key prefix segment of the domain.
    pub fn name(self) -> &'static str {
        match self {
            CacheDomain::Geocode => "geocode",
            CacheDomain::Directions => "directions",
            CacheDomain::StaticAsset => "static-asset",
        }
    }

    fn base_ttl(self, ttls: &DomainTtls) -> Duration {
        match self {
            CacheDomain::Geocode => ttls.geocode,
            CacheDomain::Directions => ttls.directions,
            CacheDomain::StaticAsset => ttls.static_asset,
        }
    }
}

// == Coordinates ==
/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// The point snapped to the keyspace precision.
    pub fn rounded(self) -> Self {
        Self {
            lat: CacheKeyspace::round_coord(self.lat),
            lng: CacheKeyspace::round_coord(self.lng),
        }
    }

    fn encode(self) -> String {
        let p = self.rounded();
        format!("{:.3},{:.3}", p.lat, p.lng)
    }
}

// == Route Request ==
/// Inputs that identify a directions lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    #[serde(default)]
    pub waypoints: Vec<Coordinates>,
    /// Travel mode such as "driving" or "walking"
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "driving".to_string()
}

impl RouteRequest {
    pub fn new(origin: Coordinates, destination: Coordinates) -> Self {
        Self {
            origin,
            destination,
            waypoints: Vec::new(),
            mode: default_mode(),
        }
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Coordinates>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }
}

// == Tiered Policy ==
/// Domain-aware front end of the cache.
#[derive(Clone)]
pub struct TieredPolicy {
    cache: Arc<CacheService>,
    ttls: DomainTtls,
    multiplier: u32,
}

impl TieredPolicy {
    /// Creates a policy; `multiplier` scales every domain TTL (0 is treated as 1).
    pub fn new(cache: Arc<CacheService>, ttls: DomainTtls, multiplier: u32) -> Self {
        Self {
            cache,
            ttls,
            multiplier: multiplier.max(1),
        }
    }

    /// Creates a policy with the configured TTLs and environment multiplier.
    pub fn from_config(cache: Arc<CacheService>, config: &Config) -> Self {
        Self::new(cache, config.domain_ttls, config.ttl_multiplier())
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    /// Effective TTL of `domain` after the multiplier.
    pub fn ttl(&self, domain: CacheDomain) -> Duration {
        domain.base_ttl(&self.ttls).saturating_mul(self.multiplier)
    }

    /// Drops every cached entry of `domain` from both tiers.
    pub async fn invalidate(&self, domain: CacheDomain) -> Invalidation {
        self.cache
            .invalidate_prefix(&format!("{}:", domain.name()))
            .await
    }

    // == Geocode ==
    /// Key of a forward geocode lookup for a free-form place query.
    pub fn geocode_key(query: &str) -> String {
        CacheKeyspace::build(
            CacheDomain::Geocode.name(),
            &[("q", KeyArg::from(normalize_place(query)))],
        )
    }

    /// Key of a reverse geocode lookup.
    pub fn reverse_geocode_key(point: Coordinates) -> String {
        CacheKeyspace::build(
            CacheDomain::Geocode.name(),
            &[("lat", point.lat.into()), ("lng", point.lng.into())],
        )
    }

    pub async fn get_geocode<T: DeserializeOwned>(&self, query: &str) -> Option<T> {
        self.cache.get(&Self::geocode_key(query)).await
    }

    pub async fn cache_geocode<T: Serialize>(&self, query: &str, value: &T) -> bool {
        self.cache
            .set(&Self::geocode_key(query), value, Some(self.ttl(CacheDomain::Geocode)))
            .await
    }

    /// Returns the cached geocode for `query` or runs `fetch` and caches it.
    pub async fn geocode_or_fetch<T, E, F, Fut>(&self, query: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cache
            .try_get_or_set(&Self::geocode_key(query), fetch, Some(self.ttl(CacheDomain::Geocode)))
            .await
    }

    pub async fn reverse_geocode_or_fetch<T, E, F, Fut>(
        &self,
        point: Coordinates,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cache
            .try_get_or_set(
                &Self::reverse_geocode_key(point),
                fetch,
                Some(self.ttl(CacheDomain::Geocode)),
            )
            .await
    }

    // == Directions ==
    /// Key of a directions lookup.
    ///
    /// Waypoints are rounded, sorted and joined, so the same set of stops
    /// always maps to the same key.
    pub fn directions_key(request: &RouteRequest) -> String {
        let mut waypoints: Vec<Coordinates> =
            request.waypoints.iter().map(|p| p.rounded()).collect();
        waypoints.sort_by(|a, b| a.lat.total_cmp(&b.lat).then(a.lng.total_cmp(&b.lng)));
        let waypoints = waypoints
            .into_iter()
            .map(Coordinates::encode)
            .collect::<Vec<_>>()
            .join("|");

        CacheKeyspace::build(
            CacheDomain::Directions.name(),
            &[
                ("from", request.origin.encode().into()),
                ("to", request.destination.encode().into()),
                ("via", waypoints.into()),
                ("mode", request.mode.trim().to_lowercase().into()),
            ],
        )
    }

    pub async fn get_directions<T: DeserializeOwned>(&self, request: &RouteRequest) -> Option<T> {
        self.cache.get(&Self::directions_key(request)).await
    }

    pub async fn cache_directions<T: Serialize>(&self, request: &RouteRequest, value: &T) -> bool {
        self.cache
            .set(
                &Self::directions_key(request),
                value,
                Some(self.ttl(CacheDomain::Directions)),
            )
            .await
    }

    pub async fn directions_or_fetch<T, E, F, Fut>(
        &self,
        request: &RouteRequest,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cache
            .try_get_or_set(
                &Self::directions_key(request),
                fetch,
                Some(self.ttl(CacheDomain::Directions)),
            )
            .await
    }

    // == Static Assets ==
    /// Key of a static asset lookup, optionally for a size variant.
    pub fn static_asset_key(reference: &str, variant: Option<&str>) -> String {
        CacheKeyspace::build(
            CacheDomain::StaticAsset.name(),
            &[
                ("ref", reference.trim().into()),
                ("variant", variant.map(|v| v.trim().to_lowercase()).into()),
            ],
        )
    }

    pub async fn get_static_asset(&self, reference: &str, variant: Option<&str>) -> Option<String> {
        self.cache
            .get(&Self::static_asset_key(reference, variant))
            .await
    }

    pub async fn cache_static_asset(&self, reference: &str, variant: Option<&str>, url: &str) -> bool {
        self.cache
            .set(
                &Self::static_asset_key(reference, variant),
                url,
                Some(self.ttl(CacheDomain::StaticAsset)),
            )
            .await
    }

    pub async fn static_asset_or_fetch<E, F, Fut>(
        &self,
        reference: &str,
        variant: Option<&str>,
        fetch: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        self.cache
            .try_get_or_set(
                &Self::static_asset_key(reference, variant),
                fetch,
                Some(self.ttl(CacheDomain::StaticAsset)),
            )
            .await
    }
}

/// Lower-cases a place query, drops punctuation and collapses whitespace.
pub fn normalize_place(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
