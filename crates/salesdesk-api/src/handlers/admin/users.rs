//! Admin account management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use salesdesk_core::types::response::ApiResponse;

use crate::dto::response::{AccountResponse, PagedResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ClientInfo, PaginationParams};
use crate::state::AppState;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PagedResponse<AccountResponse>>>> {
    state
        .auth
        .authority
        .require_global_role(&auth, state.admin_role())
        .await?;
    let page = state
        .auth
        .accounts
        .list_accounts(&params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(
        PagedResponse::map(page, AccountResponse::from),
        "Accounts",
    )))
}

/// POST /api/admin/users/{id}/block
pub async fn block_user(
    State(state): State<AppState>,
    auth: AuthUser,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .authority
        .require_global_role(&auth, state.admin_role())
        .await?;
    state
        .auth
        .accounts
        .block(auth.account_id, id, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok((), "Account blocked")))
}

/// POST /api/admin/users/{id}/unblock
pub async fn unblock_user(
    State(state): State<AppState>,
    auth: AuthUser,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .authority
        .require_global_role(&auth, state.admin_role())
        .await?;
    state
        .auth
        .accounts
        .unblock(auth.account_id, id, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok((), "Account unblocked")))
}

/// POST /api/admin/users/{id}/unlock
pub async fn unlock_user(
    State(state): State<AppState>,
    auth: AuthUser,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .authority
        .require_global_role(&auth, state.admin_role())
        .await?;
    state
        .auth
        .accounts
        .unlock(auth.account_id, id, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok((), "Account unlocked")))
}
