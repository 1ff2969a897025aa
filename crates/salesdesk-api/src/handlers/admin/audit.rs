//! Audit log query handler.

use axum::Json;
use axum::extract::{Query, State};

use salesdesk_core::types::response::ApiResponse;

use crate::dto::request::AuditLogQuery;
use crate::dto::response::{AuditEventResponse, PagedResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/admin/audit-logs
pub async fn list_audit_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<ApiResponse<PagedResponse<AuditEventResponse>>>> {
    state
        .auth
        .authority
        .require_global_role(&auth, state.admin_role())
        .await?;
    let page = state
        .auth
        .audit
        .query(
            &query.filter(),
            &query.page_request(state.config.audit.default_page_size),
        )
        .await?;
    Ok(Json(ApiResponse::ok(
        PagedResponse::map(page, AuditEventResponse::from),
        "Audit logs",
    )))
}
