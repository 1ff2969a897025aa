//! Route definitions for the SalesDesk HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    let api_routes = Router::new()
        .merge(credential_routes(state.clone()))
        .merge(auth_routes())
        .merge(session_routes())
        .merge(company_routes())
        .merge(admin_routes())
        .route("/health", get(handlers::health::health));

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Endpoints that accept a password or a one-time code, throttled per
/// client ip.
fn credential_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/verify-email", post(handlers::auth::verify_email))
        .route(
            "/auth/resend-verification",
            post(handlers::auth::resend_verification),
        )
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route(
            "/auth/verify-reset-code",
            post(handlers::auth::verify_reset_code),
        )
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::rate_limit::limit_credentials,
        ))
}

/// Token lifecycle and profile
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/me/password", put(handlers::auth::change_password))
}

/// The caller's own refresh sessions
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sessions", get(handlers::sessions::list_sessions))
        .route(
            "/auth/sessions/{session_id}",
            delete(handlers::sessions::revoke_session),
        )
}

/// Company membership management
fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(handlers::companies::my_companies))
        .route(
            "/companies/{company_id}/members",
            get(handlers::companies::list_members)
                .post(handlers::companies::add_member)
                .delete(handlers::companies::drop_members),
        )
        .route(
            "/companies/{company_id}/members/{user_id}",
            delete(handlers::companies::remove_member),
        )
        .route(
            "/companies/{company_id}/members/{user_id}/role",
            put(handlers::companies::assign_role),
        )
        .route(
            "/companies/{company_id}/members/{user_id}/level",
            put(handlers::companies::set_level),
        )
        .route(
            "/companies/{company_id}/members/{user_id}/permissions",
            put(handlers::companies::set_permissions),
        )
}

/// Platform administration
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(handlers::admin::users::list_users))
        .route(
            "/admin/users/{id}/block",
            post(handlers::admin::users::block_user),
        )
        .route(
            "/admin/users/{id}/unblock",
            post(handlers::admin::users::unblock_user),
        )
        .route(
            "/admin/users/{id}/unlock",
            post(handlers::admin::users::unlock_user),
        )
        .route(
            "/admin/audit-logs",
            get(handlers::admin::audit::list_audit_logs),
        )
}
