//! Company membership handlers.
//!
//! Company records themselves live in the CRM; this surface manages only
//! who belongs to a company and with which role, level and permissions.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use salesdesk_auth::{Principal, Requirement};
use salesdesk_core::error::AppError;
use salesdesk_core::types::response::ApiResponse;
use salesdesk_entity::company::{CompanyRole, CompanyRoleBinding, PermissionSet};

use crate::dto::request::{AddMemberRequest, LevelRequest, PermissionsRequest, RoleRequest};
use crate::dto::response::BindingResponse;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

const MANAGERS: [CompanyRole; 2] = [CompanyRole::Superadmin, CompanyRole::Admin];

async fn require_manager(
    state: &AppState,
    principal: &Principal,
    company_id: Uuid,
) -> ApiResult<CompanyRoleBinding> {
    Ok(state
        .auth
        .authority
        .require(principal, company_id, &Requirement::any_role(&MANAGERS))
        .await?)
}

/// A manager allowed to change `user_id`'s membership. Members who hold
/// the Superadmin role can only be changed by another Superadmin.
async fn require_manager_of(
    state: &AppState,
    principal: &Principal,
    company_id: Uuid,
    user_id: Uuid,
) -> ApiResult<CompanyRoleBinding> {
    let caller = require_manager(state, principal, company_id).await?;
    let target = state.auth.authority.binding(user_id, company_id).await?;
    check_target(&caller, target.as_ref())?;
    Ok(caller)
}

/// Only a Superadmin may hand out the Superadmin role.
fn check_grant(caller: &CompanyRoleBinding, role: CompanyRole) -> Result<(), AppError> {
    if role == CompanyRole::Superadmin && caller.role != CompanyRole::Superadmin {
        return Err(AppError::forbidden("Only a Superadmin can grant the Superadmin role"));
    }
    Ok(())
}

fn check_target(caller: &CompanyRoleBinding, target: Option<&CompanyRoleBinding>) -> Result<(), AppError> {
    let target_is_superadmin = target.is_some_and(|t| t.role == CompanyRole::Superadmin);
    if target_is_superadmin && caller.role != CompanyRole::Superadmin {
        return Err(AppError::forbidden("Only a Superadmin can change a Superadmin"));
    }
    Ok(())
}

/// GET /api/companies
pub async fn my_companies(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<BindingResponse>>>> {
    let bindings = state.auth.membership.list_for_user(auth.account_id).await?;
    Ok(Json(ApiResponse::ok(
        bindings.into_iter().map(BindingResponse::from).collect(),
        "Companies",
    )))
}

/// GET /api/companies/{companyId}/members
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<BindingResponse>>>> {
    state
        .auth
        .authority
        .require(&auth, company_id, &Requirement::any_role(&CompanyRole::ALL))
        .await?;
    let members = state.auth.membership.list_for_company(company_id).await?;
    Ok(Json(ApiResponse::ok(
        members.into_iter().map(BindingResponse::from).collect(),
        "Company members",
    )))
}

/// POST /api/companies/{companyId}/members
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<BindingResponse>>)> {
    let caller = require_manager(&state, &auth, company_id).await?;
    let role = match req.role.as_deref() {
        Some(name) => CompanyRole::from_str(name)?,
        None => CompanyRole::Salesman,
    };
    check_grant(&caller, role)?;

    let binding = state
        .auth
        .membership
        .join(company_id, req.user_id, role, Some(auth.account_id))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(BindingResponse::from(binding), "Member added")),
    ))
}

/// PUT /api/companies/{companyId}/members/{userId}/role
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<RoleRequest>,
) -> ApiResult<Json<ApiResponse<BindingResponse>>> {
    let caller = require_manager_of(&state, &auth, company_id, user_id).await?;
    let role = CompanyRole::from_str(&req.role)?;
    check_grant(&caller, role)?;

    let binding = state
        .auth
        .membership
        .assign_role(company_id, user_id, role, Some(auth.account_id))
        .await?;
    Ok(Json(ApiResponse::ok(BindingResponse::from(binding), "Role assigned")))
}

/// PUT /api/companies/{companyId}/members/{userId}/level
pub async fn set_level(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<LevelRequest>,
) -> ApiResult<Json<ApiResponse<BindingResponse>>> {
    require_manager_of(&state, &auth, company_id, user_id).await?;
    let binding = state
        .auth
        .membership
        .set_level(company_id, user_id, req.level, Some(auth.account_id))
        .await?;
    Ok(Json(ApiResponse::ok(BindingResponse::from(binding), "Level assigned")))
}

/// PUT /api/companies/{companyId}/members/{userId}/permissions
pub async fn set_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<PermissionsRequest>,
) -> ApiResult<Json<ApiResponse<BindingResponse>>> {
    require_manager_of(&state, &auth, company_id, user_id).await?;
    let permissions = PermissionSet::parse_all(req.permissions.as_slice())?;
    let binding = state
        .auth
        .membership
        .set_permissions(company_id, user_id, permissions, Some(auth.account_id))
        .await?;
    Ok(Json(ApiResponse::ok(BindingResponse::from(binding), "Permissions updated")))
}

/// DELETE /api/companies/{companyId}/members/{userId}
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    require_manager_of(&state, &auth, company_id, user_id).await?;
    state
        .auth
        .membership
        .remove(company_id, user_id, Some(auth.account_id))
        .await?;
    Ok(Json(ApiResponse::ok((), "Member removed")))
}

/// DELETE /api/companies/{companyId}/members
///
/// Drops every binding of the company, as when the company is deleted.
pub async fn drop_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    state
        .auth
        .authority
        .require(&auth, company_id, &Requirement::any_role(&[CompanyRole::Superadmin]))
        .await?;
    let removed = state
        .auth
        .membership
        .drop_company(company_id, Some(auth.account_id))
        .await?;
    Ok(Json(ApiResponse::ok(
        serde_json::json!({ "removed": removed }),
        "Company memberships removed",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_superadmin_grants_superadmin() {
        let company = Uuid::new_v4();
        let admin = CompanyRoleBinding::new(Uuid::new_v4(), company, CompanyRole::Admin);
        let owner = CompanyRoleBinding::new(Uuid::new_v4(), company, CompanyRole::Superadmin);

        assert!(check_grant(&admin, CompanyRole::Superadmin).is_err());
        assert!(check_grant(&admin, CompanyRole::Supervisor).is_ok());
        assert!(check_grant(&owner, CompanyRole::Superadmin).is_ok());
    }

    #[test]
    fn only_superadmin_changes_superadmin() {
        let company = Uuid::new_v4();
        let admin = CompanyRoleBinding::new(Uuid::new_v4(), company, CompanyRole::Admin);
        let owner = CompanyRoleBinding::new(Uuid::new_v4(), company, CompanyRole::Superadmin);
        let rep = CompanyRoleBinding::new(Uuid::new_v4(), company, CompanyRole::Salesman);

        assert!(check_target(&admin, Some(&owner)).is_err());
        assert!(check_target(&admin, Some(&rep)).is_ok());
        assert!(check_target(&admin, None).is_ok());
        assert!(check_target(&owner, Some(&owner)).is_ok());
    }
}
