//! Health check handler.

use axum::Json;
use axum::extract::State;

use salesdesk_core::traits::cache::CacheProvider;
use salesdesk_core::types::response::ApiResponse;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let cache = state.cache.health_check().await.unwrap_or(false);
    let database = match &state.database {
        Some(pool) => Some(pool.ping().await),
        None => None,
    };
    let healthy = cache && database.unwrap_or(true);
    Json(ApiResponse::ok(
        HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cache,
            database,
            lost_audit_events: state.auth.audit.lost_events(),
        },
        "Service is running",
    ))
}
