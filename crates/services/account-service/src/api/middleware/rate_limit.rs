//! Rate limiting middleware using Redis cache.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use common::AppError;

use crate::api::AppState;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Rate limit error response
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = AppError::TooManyRequests.into_response();
        let headers = response.headers_mut();
        headers.insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from(self.retry_after),
        );
        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
        response
    }
}

/// Extract client identifier for rate limiting.
///
/// The peer address is used unless `trust_proxy_headers` is set, in which
/// case the address the proxy appended last to `X-Forwarded-For` (or its
/// `X-Real-IP`) wins. Client-supplied entries earlier in the chain are never
/// used as the key.
fn client_identifier(request: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = request
            .headers()
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|forwarded| forwarded.rsplit(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return ip.to_string();
        }

        if let Some(real_ip) = request
            .headers()
            .get("X-Real-IP")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return real_ip.to_string();
        }
    }

    if let Some(connect_info) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting for the authentication endpoints.
///
/// Counts requests per client IP in a fixed Redis window. Without a
/// configured Redis the request passes through; a Redis failure denies it.
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let Some(cache) = state.cache.as_ref() else {
        return Ok(next.run(request).await);
    };
    let limit = &state.auth_rate_limit;
    let client_id = client_identifier(&request, limit.trust_proxy_headers);
    let key = format!("auth:{}", client_id);

    let (count, allowed) = match cache
        .check_rate_limit(&key, limit.max_requests, limit.window_seconds)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            // Fail closed: an unreachable Redis denies the request
            tracing::error!(error = %e, "Auth rate limit check failed - denying request");
            return Err(RateLimitError {
                retry_after: limit.window_seconds,
            });
        }
    };

    if !allowed {
        tracing::warn!(client = %client_id, count, "Auth rate limit exceeded");
        return Err(RateLimitError {
            retry_after: limit.window_seconds,
        });
    }

    let mut response = next.run(request).await;

    let remaining = limit.max_requests.saturating_sub(count);
    let headers = response.headers_mut();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit.max_requests));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));

    Ok(response)
}
