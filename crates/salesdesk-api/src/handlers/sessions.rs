//! Self-service session handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use salesdesk_auth::RefreshToken;
use salesdesk_core::types::response::ApiResponse;

use crate::cookie;
use crate::dto::response::SessionResponse;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ClientInfo};
use crate::state::AppState;

/// GET /api/auth/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> ApiResult<Json<ApiResponse<Vec<SessionResponse>>>> {
    let current = cookie::refresh_token(&jar, &state.config.auth).map(RefreshToken::from_raw);
    let current_digest = current.as_ref().map(RefreshToken::digest);

    let sessions = state
        .auth
        .sessions
        .list_sessions(auth.account_id)
        .await?
        .into_iter()
        .map(|s| SessionResponse::from_session(s, current_digest))
        .collect();
    Ok(Json(ApiResponse::ok(sessions, "Active sessions")))
}

/// DELETE /api/auth/sessions/{sessionId}
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: AuthUser,
    client: ClientInfo,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .sessions
        .revoke_session(auth.account_id, session_id, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok((), "Session revoked")))
}
