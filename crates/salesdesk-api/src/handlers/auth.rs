//! Auth handlers: registration, verification, login, refresh, logout,
//! password recovery and the caller's own profile.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;

use salesdesk_auth::RegisterAccount;
use salesdesk_core::error::AppError;
use salesdesk_core::types::response::ApiResponse;

use crate::cookie;
use crate::dto::request::{
    ChangePasswordRequest, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    VerifyEmailRequest, VerifyResetCodeRequest,
};
use crate::dto::response::{AccountResponse, LoginResponse, RefreshResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ClientInfo, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AccountResponse>>)> {
    let account = state
        .auth
        .accounts
        .register(
            RegisterAccount {
                name: req.name,
                email: req.email,
                password: req.password,
                phone: req.phone,
            },
            client.metadata(),
        )
        .await?;

    let message = if account.email_verified {
        "Registration successful"
    } else {
        "Registration successful, check your email for the verification code"
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AccountResponse::from(account), message)),
    ))
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<VerifyEmailRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .accounts
        .verify_email(&req.email, &req.code, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok((), "Email verified")))
}

/// POST /api/auth/resend-verification
pub async fn resend_verification(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.auth.accounts.resend_verification(&req.email).await?;
    Ok(Json(ApiResponse::ok((), "Verification code sent")))
}

/// POST /api/auth/login
///
/// The access token is returned in the body, the refresh token only in
/// the HttpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let outcome = state
        .auth
        .sessions
        .login(&req.email, &req.password, client.metadata())
        .await?;

    let jar = cookie::set_refresh_token(jar, &state.config.auth, outcome.tokens.refresh_token.as_str());
    let body = LoginResponse {
        access_token: outcome.tokens.access_token,
        access_token_expires_at: outcome.tokens.access_expires_at,
        user: AccountResponse::from(outcome.account),
    };
    Ok((jar, Json(ApiResponse::ok(body, "Login successful"))))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    client: ClientInfo,
) -> ApiResult<(CookieJar, Json<ApiResponse<RefreshResponse>>)> {
    let raw = cookie::refresh_token(&jar, &state.config.auth)
        .ok_or_else(|| AppError::unauthorized("Refresh token missing"))?;

    let outcome = state.auth.sessions.refresh(&raw, client.metadata()).await?;

    let jar = cookie::set_refresh_token(jar, &state.config.auth, outcome.tokens.refresh_token.as_str());
    let body = RefreshResponse {
        access_token: outcome.tokens.access_token,
        access_token_expires_at: outcome.tokens.access_expires_at,
    };
    Ok((jar, Json(ApiResponse::ok(body, "Token refreshed"))))
}

/// POST /api/auth/logout
///
/// Succeeds with or without a cookie, and for tokens that are already
/// revoked or unknown.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    client: ClientInfo,
) -> ApiResult<(CookieJar, Json<ApiResponse<()>>)> {
    if let Some(raw) = cookie::refresh_token(&jar, &state.config.auth) {
        state.auth.sessions.logout(&raw, client.metadata()).await?;
    }
    let jar = cookie::clear_refresh_token(jar, &state.config.auth);
    Ok((jar, Json(ApiResponse::ok((), "Logged out"))))
}

/// POST /api/auth/forgot-password
///
/// Always answers the same way so the endpoint does not reveal which
/// emails are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .accounts
        .forgot_password(&req.email, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok(
        (),
        "If the email is registered, a reset code has been sent",
    )))
}

/// POST /api/auth/verify-reset-code
pub async fn verify_reset_code(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyResetCodeRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .accounts
        .verify_reset_code(&req.email, &req.code)
        .await?;
    Ok(Json(ApiResponse::ok((), "Reset code is valid")))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .accounts
        .reset_password(&req.email, &req.code, &req.new_password, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok((), "Password has been reset, please log in again")))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<AccountResponse>>> {
    let account = state.auth.accounts.get(auth.account_id).await?;
    Ok(Json(ApiResponse::ok(AccountResponse::from(account), "Current account")))
}

/// PUT /api/auth/me/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .auth
        .accounts
        .change_password(auth.account_id, &req.old_password, &req.new_password, client.metadata())
        .await?;
    Ok(Json(ApiResponse::ok((), "Password changed")))
}
