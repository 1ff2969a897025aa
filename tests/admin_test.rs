//! Integration tests for account administration and the audit log.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_admin_endpoints_require_global_role() {
    let app = TestApp::new().await;
    let user = app.account_session("plain@example.com", &[]).await;

    let users = app
        .request("GET", "/api/admin/users", None, Some(&user.access_token))
        .await;
    assert_eq!(users.status, StatusCode::FORBIDDEN);

    let logs = app
        .request("GET", "/api/admin/audit-logs", None, Some(&user.access_token))
        .await;
    assert_eq!(logs.status, StatusCode::FORBIDDEN);

    let anonymous = app.request("GET", "/api/admin/users", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_is_paginated() {
    let app = TestApp::new().await;
    let support = app.account_session("support@example.com", &["it_support"]).await;
    for i in 0..4 {
        app.create_account(&format!("user{i}@example.com"), &[]).await;
    }

    let page = app
        .request(
            "GET",
            "/api/admin/users?page=2&limit=2",
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.data()["total"], 5);
    assert_eq!(page.data()["totalPages"], 3);
    assert_eq!(page.data()["limit"], 2);
    assert_eq!(page.data()["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_block_revokes_sessions_and_unblock_restores_login() {
    let app = TestApp::new().await;
    let support = app.account_session("support2@example.com", &["it_support"]).await;
    let target = app.account_session("target@example.com", &[]).await;

    let self_block = app
        .request(
            "POST",
            &format!("/api/admin/users/{}/block", support.account_id),
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(self_block.status, StatusCode::BAD_REQUEST);

    let blocked = app
        .request(
            "POST",
            &format!("/api/admin/users/{}/block", target.account_id),
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(blocked.status, StatusCode::OK);

    let refresh = app
        .request_with_cookie("POST", "/api/auth/refresh", None, None, Some(&target.refresh_token))
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);

    let me = app
        .request("GET", "/api/auth/me", None, Some(&target.access_token))
        .await;
    assert_eq!(me.status, StatusCode::FORBIDDEN);
    assert_eq!(me.error_code(), Some("ACCOUNT_BLOCKED"));

    let login = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "target@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(login.error_code(), Some("ACCOUNT_BLOCKED"));

    let unblocked = app
        .request(
            "POST",
            &format!("/api/admin/users/{}/unblock", target.account_id),
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(unblocked.status, StatusCode::OK);
    app.login("target@example.com", PASSWORD).await;
}

#[tokio::test]
async fn test_unlock_clears_lockout() {
    let app = TestApp::new().await;
    let support = app.account_session("support3@example.com", &["it_support"]).await;
    let target = app.create_account("lockme@example.com", &[]).await;

    for _ in 0..5 {
        app.request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "lockme@example.com", "password": "Wrong-Password-123" })),
            None,
        )
        .await;
    }

    let unlocked = app
        .request(
            "POST",
            &format!("/api/admin/users/{target}/unlock"),
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(unlocked.status, StatusCode::OK);
    app.login("lockme@example.com", PASSWORD).await;

    let missing = app
        .request(
            "POST",
            &format!("/api/admin/users/{}/unlock", uuid::Uuid::new_v4()),
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error_code(), Some("USER_NOT_FOUND"));
}

#[tokio::test]
async fn test_audit_log_records_authentication_events() {
    let app = TestApp::new().await;
    let support = app.account_session("auditor@example.com", &["it_support"]).await;
    let user = app.account_session("audited@example.com", &[]).await;
    app.request(
        "POST",
        "/api/auth/login",
        Some(json!({ "email": "audited@example.com", "password": "Wrong-Password-123" })),
        None,
    )
    .await;
    app.flush_audit().await;

    let logins = app
        .request(
            "GET",
            &format!("/api/admin/audit-logs?action=login_success&actorId={}", user.account_id),
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(logins.status, StatusCode::OK);
    assert_eq!(logins.data()["total"], 1);
    let event = &logins.data()["items"][0];
    assert_eq!(event["action"], "login_success");
    assert_eq!(event["actorId"], user.account_id.to_string());

    let failures = app
        .request(
            "GET",
            "/api/admin/audit-logs?action=login_failed",
            None,
            Some(&support.access_token),
        )
        .await;
    assert_eq!(failures.data()["total"], 1);

    let all = app
        .request("GET", "/api/admin/audit-logs?limit=1", None, Some(&support.access_token))
        .await;
    assert_eq!(all.data()["items"].as_array().unwrap().len(), 1);
    assert!(all.data()["total"].as_u64().unwrap() >= 3);
}
