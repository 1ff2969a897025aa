//! Shared helpers for the HTTP integration tests.
//!
//! Every `TestApp` runs the full router over in-memory repositories and an
//! in-memory cache, so tests are isolated from each other and need no
//! external services.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use salesdesk_api::{AppState, build_router};
use salesdesk_auth::{LogNotifier, PasswordHasher};
use salesdesk_cache::provider::CacheManager;
use salesdesk_core::config::AppConfig;
use salesdesk_database::repositories::Repositories;
use salesdesk_entity::account::CreateAccount;
use salesdesk_entity::company::CompanyRole;

/// A password that satisfies the default strength policy.
pub const PASSWORD: &str = "Violet-Harbor-Lantern-42";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for seeding and inspecting data directly
    pub state: AppState,
}

/// Status, parsed JSON body and refresh cookie of one response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Value of the refresh cookie set by the response, if any.
    pub refresh_cookie: Option<String>,
}

impl TestResponse {
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("errorCode").and_then(Value::as_str)
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// Tokens of a logged in account.
#[derive(Debug, Clone)]
pub struct LoggedIn {
    pub account_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

/// Configuration used by tests: memory store and a rate limit high enough
/// not to interfere.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.store.backend = "memory".to_string();
    config.auth.jwt_secret = "integration-test-secret-with-enough-bytes".to_string();
    config.auth.rate_limit.max_requests = 10_000;
    config
}

impl TestApp {
    /// Create a new test application with the default test configuration
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(
            config,
            Repositories::in_memory(),
            Arc::new(CacheManager::in_memory()),
            Arc::new(LogNotifier),
        );
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Send a JSON request with an optional bearer token.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_with_cookie(method, path, body, token, None).await
    }

    /// Send a JSON request with an optional bearer token and refresh cookie.
    pub async fn request_with_cookie(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        refresh_cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = refresh_cookie {
            builder = builder.header(COOKIE, format!("refreshToken={cookie}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Send a fully built request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let refresh_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| v.strip_prefix("refreshToken="))
            .map(|v| v.split(';').next().unwrap_or_default().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            body,
            refresh_cookie,
        }
    }

    /// Insert a verified account directly and return its id.
    pub async fn create_account(&self, email: &str, global_roles: &[&str]) -> Uuid {
        let hash = PasswordHasher::default().hash_password(PASSWORD).unwrap();
        let account = self
            .state
            .repos
            .accounts
            .create(CreateAccount {
                name: "Test User".to_string(),
                email: email.to_string(),
                phone: None,
                password_hash: hash,
                email_verified: true,
                verification_code: None,
                verification_code_expires_at: None,
                global_roles: global_roles.iter().map(|r| r.to_string()).collect(),
            })
            .await
            .unwrap();
        account.id
    }

    /// Log in through the API and return both tokens.
    pub async fn login(&self, email: &str, password: &str) -> LoggedIn {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        LoggedIn {
            account_id: response.data()["user"]["id"]
                .as_str()
                .and_then(|id| id.parse().ok())
                .unwrap(),
            access_token: response.data()["accessToken"].as_str().unwrap().to_string(),
            refresh_token: response.refresh_cookie.clone().unwrap(),
        }
    }

    /// Create a verified account and log it in.
    pub async fn account_session(&self, email: &str, global_roles: &[&str]) -> LoggedIn {
        self.create_account(email, global_roles).await;
        self.login(email, PASSWORD).await
    }

    /// Bind an account to a company directly.
    pub async fn join(&self, company_id: Uuid, user_id: Uuid, role: CompanyRole) {
        self.state
            .auth
            .membership
            .join(company_id, user_id, role, None)
            .await
            .unwrap();
    }

    /// Wait for queued audit events to be written.
    pub async fn flush_audit(&self) {
        self.state.auth.audit.flush().await.unwrap();
    }
}
