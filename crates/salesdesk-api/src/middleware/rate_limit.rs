//! Fixed-window rate limiter for credential endpoints.
//!
//! Counters live in the shared cache so every instance behind a load
//! balancer sees the same window when Redis is configured.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use salesdesk_cache::keys;
use salesdesk_core::error::AppError;
use salesdesk_core::traits::cache::CacheProvider;

use crate::error::ApiError;
use crate::extractors::ClientInfo;
use crate::state::AppState;

/// Rejects the request with 429 once the client exceeds
/// `auth.rate_limit.max_requests` within the window. The counter is keyed
/// by the last path segment (`login`, `verify-reset-code`, ...) and the
/// client ip, so every endpoint has its own window.
///
/// A cache failure lets the request through.
pub async fn limit_credentials(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limits = &state.config.auth.rate_limit;
    if !limits.enabled {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let client = ClientInfo::from_parts(&parts, state.config.server.trust_forwarded_headers);
    let scope = parts
        .uri
        .path()
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("root")
        .to_string();
    let key = keys::rate_limit(&scope, client.rate_limit_key());

    match state
        .cache
        .incr(&key, Duration::from_secs(limits.window_seconds))
        .await
    {
        Ok(count) if count > i64::from(limits.max_requests) => {
            warn!(scope = %scope, client = %client.rate_limit_key(), count, "Rate limit exceeded");
            return ApiError(AppError::rate_limited("Too many requests, please try again later"))
                .into_response();
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, scope = %scope, "Rate limit check failed, allowing request"),
    }

    next.run(Request::from_parts(parts, body)).await
}
