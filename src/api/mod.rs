//! API Module
//!
//! Admin HTTP surface for the cache and the response-cache middleware.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `DELETE /cache/keys/:key` - Delete a key from both tiers
//! - `DELETE /cache/prefixes/:prefix` - Invalidate a key prefix

pub mod handlers;
pub mod interceptor;
pub mod routes;

pub use handlers::*;
pub use interceptor::{response_cache, CachedResponse, CACHE_STATUS_HEADER};
pub use routes::{create_router, mount};
