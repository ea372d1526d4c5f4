//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{Tier, TierStats};
use crate::remote::ConnectionState;
use crate::service::Invalidation;

/// Response body for the health endpoint (GET /health)
///
/// The service stays healthy while the remote tier is down; `status` reads
/// "degraded" in that case so dashboards can tell the difference.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// Tier currently serving reads
    pub tier: Tier,
    /// Remote connection state, absent in local-only mode
    pub remote_state: Option<ConnectionState>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a HealthResponse from the facade's current state
    pub fn from_state(stats: &TierStats, remote_state: Option<ConnectionState>) -> Self {
        let degraded = remote_state.is_some() && !stats.connected;
        Self {
            status: if degraded { "degraded" } else { "healthy" }.to_string(),
            tier: stats.tier,
            remote_state,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the DELETE /cache/keys/:key operation
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE /cache/prefixes/:prefix operation
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub prefix: String,
    /// Keys removed remotely, null when the remote tier was unreachable
    pub remote: Option<u64>,
    /// Entries removed from the local tier
    pub local: usize,
}

impl InvalidateResponse {
    pub fn new(prefix: impl Into<String>, outcome: Invalidation) -> Self {
        Self {
            prefix: prefix.into(),
            remote: outcome.remote,
            local: outcome.local,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
