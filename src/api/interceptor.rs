//! Response-cache middleware
//!
//! Wraps application routes so successful GET responses are served from the
//! cache. Handlers behind it are unaware of caching; the key is derived from
//! the request path and query string, so only responses that are the same
//! for every caller may be stored.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, response::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::handlers::AppState;
use crate::keyspace::CacheKeyspace;

/// Header reporting whether the response came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Bodies larger than this are passed through uncached.
pub const MAX_CACHED_BODY: usize = 256 * 1024;

/// Connection-scoped headers, plus the length which the body recomputes.
const UNSTORED_HEADERS: [&str; 10] = [
    "connection",
    "content-length",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "set-cookie",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Buffered form of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    /// End-to-end headers in the order the handler set them
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    fn capture(parts: &Parts, body: &[u8]) -> Self {
        let headers = parts
            .headers
            .iter()
            .filter(|(name, _)| !UNSTORED_HEADERS.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            status: parts.status.as_u16(),
            headers,
            body: body.to_vec(),
        }
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                headers.append(name, value);
            }
        }
        response
    }
}

/// Cache key for a request URI.
pub fn response_key(uri: &Uri) -> String {
    CacheKeyspace::build(
        "response",
        &[("path", uri.path().into()), ("query", uri.query().into())],
    )
}

/// Middleware entry point, mounted with `axum::middleware::from_fn_with_state`.
pub async fn response_cache(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET || carries_credentials(request.headers()) {
        return next.run(request).await;
    }

    let key = response_key(request.uri());
    if let Some(cached) = state.cache.get::<CachedResponse>(&key).await {
        debug!(key = %key, cache = "hit", "response cache");
        return with_cache_status(cached.into_response(), "hit");
    }

    let response = next.run(request).await;
    if !response.status().is_success() || !is_shareable(response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if bytes.len() > MAX_CACHED_BODY {
        return Response::from_parts(parts, Body::from(bytes));
    }

    let cached = CachedResponse::capture(&parts, &bytes);
    state.cache.set(&key, &cached, Some(state.response_ttl)).await;
    debug!(key = %key, cache = "miss", "response cache");

    with_cache_status(Response::from_parts(parts, Body::from(bytes)), "miss")
}

/// The key ignores who is asking, so credentialed requests never share it.
fn carries_credentials(headers: &HeaderMap) -> bool {
    headers.contains_key(header::AUTHORIZATION) || headers.contains_key(header::COOKIE)
}

fn is_shareable(headers: &HeaderMap) -> bool {
    if headers.contains_key(header::SET_COOKIE) {
        return false;
    }
    !headers
        .get_all(header::CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|directive| directive.trim().to_ascii_lowercase())
        .any(|directive| directive == "private" || directive == "no-store")
}

fn with_cache_status(mut response: Response, status: &'static str) -> Response {
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(status));
    response
}
