//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror. None of these errors
//! escape the cache operations of [`crate::service::CacheService`]; they are
//! logged there and turned into misses or no-ops. They do surface from the
//! admin API and from the lower-level building blocks.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Remote Error Enum ==
/// Failure of a single call against the remote tier.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Client is not connected; the call never reached the network
    #[error("remote cache unavailable")]
    Unavailable,

    /// The call exceeded the configured command timeout
    #[error("remote cache call timed out after {0:?}")]
    Timeout(Duration),

    /// Transport or protocol error reported by the backend
    #[error("remote cache command failed: {0}")]
    Command(#[from] redis::RedisError),

    /// The configured connection target could not be parsed
    #[error("invalid remote cache target: {0}")]
    InvalidTarget(String),
}

impl RemoteError {
    /// Returns true when the error means the connection itself is unhealthy,
    /// as opposed to a rejected command on a live connection.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            RemoteError::Unavailable | RemoteError::Timeout(_) => true,
            RemoteError::Command(e) => {
                e.is_io_error()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
                    || e.is_timeout()
            }
            RemoteError::InvalidTarget(_) => false,
        }
    }
}

/// Convenience Result type for remote tier calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local store is full and eviction failed
    #[error("Cache full: {0}")]
    Capacity(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Remote tier failure
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Capacity(_) | CacheError::Remote(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
