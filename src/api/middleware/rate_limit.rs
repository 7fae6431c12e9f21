//! Per-client rate limiting middleware

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::observability::record_rate_limit_rejection;
use crate::infrastructure::rate_limit::RateLimitResult;

/// Health checks and metric scrapes are never limited
const EXEMPT_PATHS: &[&str] = &["/health", "/live", "/metrics"];

const ANONYMOUS_CLIENT: &str = "anonymous";

pub const RATE_LIMIT_MESSAGE: &str =
    "Rate limit exceeded. Please slow down and try again shortly.";

/// Rejects requests over the per-client quota with 429
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(request).await;
    };

    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let client = client_identifier(&request, limiter.config().trust_forwarded_for);
    let result = limiter.check_and_record(&client).await;

    if !result.allowed {
        warn!(client = %client, limit = result.limit, "Rate limit exceeded");
        record_rate_limit_rejection();

        let mut response = ApiError::rate_limited(RATE_LIMIT_MESSAGE)
            .with_code("rate_limit_exceeded")
            .into_response();
        insert_rate_limit_headers(response.headers_mut(), &result);
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(result.reset_in_seconds));
        return response;
    }

    let mut response = next.run(request).await;
    insert_rate_limit_headers(response.headers_mut(), &result);
    response
}

/// The peer address, or `anonymous` when the connection info is missing.
///
/// With `trust_forwarded_for` the first `x-forwarded-for` hop takes precedence.
pub fn client_identifier(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(result.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(result.remaining));
}
