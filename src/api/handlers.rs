//! API Handlers
//!
//! HTTP request handlers for the admin endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::ServiceStats;
use crate::error::{CacheError, Result};
use crate::models::{DeleteResponse, HealthResponse, InvalidateResponse};
use crate::service::CacheService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache facade
    pub cache: Arc<CacheService>,
    /// TTL applied to responses stored by the response-cache middleware
    pub response_ttl: Duration,
}

impl AppState {
    /// Creates a new AppState whose response TTL is the cache's default TTL.
    pub fn new(cache: Arc<CacheService>) -> Self {
        let response_ttl = cache.default_ttl();
        Self {
            cache,
            response_ttl,
        }
    }

    pub fn with_response_ttl(mut self, ttl: Duration) -> Self {
        self.response_ttl = ttl;
        self
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.cache.stats();
    Json(HealthResponse::from_state(&stats, state.cache.connection_state()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ServiceStats> {
    Json(state.cache.detailed_stats().await)
}

/// Handler for DELETE /cache/keys/:key
///
/// Returns 404 when neither tier held the key.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }

    if state.cache.del(&key).await {
        info!(key = %key, "key deleted via admin api");
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for DELETE /cache/prefixes/:prefix
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if prefix.trim().is_empty() {
        return Err(CacheError::InvalidRequest(
            "Prefix cannot be empty".to_string(),
        ));
    }

    let outcome = state.cache.invalidate_prefix(&prefix).await;
    info!(
        prefix = %prefix,
        remote = ?outcome.remote,
        local = outcome.local,
        "prefix invalidated via admin api"
    );
    Ok(Json(InvalidateResponse::new(prefix, outcome)))
}
