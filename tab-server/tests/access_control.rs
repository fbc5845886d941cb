//! Authentication, roles and the login redirect flow

mod common;

use chrono::Duration;
use common::spawn_app;
use http::{Method, StatusCode, header};
use serde_json::json;
use shared::models::UserRole;
use tab_server::db::repository::user;

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = spawn_app().await;
    let (status, body) = app.send(Method::GET, "/api/tabs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_error");
    assert_eq!(body["code"], 1001);

    let (status, _) = app.send(Method::GET, "/api/tabs", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = spawn_app().await;
    let (ana, _) = app.login_as("ana@bar.test", UserRole::Operator).await;
    let expired = app
        .state
        .jwt_service
        .generate_token_with_ttl(&ana, Duration::hours(-2))
        .unwrap();

    let (status, body) = app.get("/api/tabs", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);
}

#[tokio::test]
async fn deactivated_user_loses_access_immediately() {
    let app = spawn_app().await;
    let (ana, token) = app.login_as("ana@bar.test", UserRole::Operator).await;
    let (status, _) = app.get("/api/tabs", &token).await;
    assert_eq!(status, StatusCode::OK);

    user::update(
        &app.state.pool,
        ana.id,
        user::UserChanges {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (status, body) = app.get("/api/tabs", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1007);
}

#[tokio::test]
async fn role_is_read_from_the_store() {
    let app = spawn_app().await;
    let (ana, token) = app.login_as("ana@bar.test", UserRole::Admin).await;
    let (status, _) = app.get("/api/users", &token).await;
    assert_eq!(status, StatusCode::OK);

    user::update(
        &app.state.pool,
        ana.id,
        user::UserChanges {
            role: Some(UserRole::Operator),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // same token, demoted in the store
    let (status, _) = app.get("/api/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_admin_is_admin_only() {
    let app = spawn_app().await;
    let operator = app.operator().await;
    let (status, body) = app.get("/api/users", &operator).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let admin = app.admin().await;
    let (status, created) = app
        .post(
            "/api/users",
            &admin,
            json!({ "email": "caixa@bar.test", "role": "operator" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "caixa");
    assert_eq!(created["is_active"], true);
    assert!(created.get("google_id").is_none());

    let (status, body) = app
        .post("/api/users", &admin, json!({ "email": "CAIXA@bar.test" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6002);

    let (_, users) = app.get("/api/users", &admin).await;
    assert_eq!(users.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn admins_cannot_lock_themselves_out() {
    let app = spawn_app().await;
    let (me, token) = app.login_as("boss@bar.test", UserRole::Admin).await;
    let uri = format!("/api/users/{}", me.id);

    let (status, body) = app.put(&uri, &token, json!({ "is_active": false })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2006);

    let (status, _) = app.put(&uri, &token, json!({ "role": "operator" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, renamed) = app.put(&uri, &token, json!({ "name": "Chefe" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Chefe");
}

#[tokio::test]
async fn only_admins_reopen_tabs() {
    let app = spawn_app().await;
    let operator = app.operator().await;
    let admin = app.admin().await;

    let (_, tab) = app.post("/api/tabs", &operator, json!({ "customer": "Mesa 2" })).await;
    let uri = format!("/api/tabs/{}", tab["id"]);
    let (status, _) = app.put(&uri, &operator, json!({ "status": "closed" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.put(&uri, &operator, json!({ "status": "open" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    let (status, reopened) = app.put(&uri, &admin, json!({ "status": "open" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["status"], "open");
    assert!(reopened["closed_at"].is_null());
}

#[tokio::test]
async fn me_returns_the_stored_user() {
    let app = spawn_app().await;
    let (ana, token) = app.login_as("ana@bar.test", UserRole::Operator).await;
    let (status, body) = app.get("/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], ana.id);
    assert_eq!(body["user"]["role"], "operator");

    let (status, _) = app.send(Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn socket_refuses_missing_or_bad_tokens() {
    let app = spawn_app().await;
    let (status, body) = app.send(Method::GET, "/api/socket", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_error");

    let (status, _) = app
        .send(Method::GET, "/api/socket?token=garbage", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // valid token, but a plain GET cannot be upgraded
    let token = app.operator().await;
    let (status, _) = app
        .send(Method::GET, &format!("/api/socket?token={token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn socket_refuses_expired_and_disabled_tokens() {
    let app = spawn_app().await;
    let (ana, token) = app.login_as("ana@bar.test", UserRole::Operator).await;
    let expired = app
        .state
        .jwt_service
        .generate_token_with_ttl(&ana, Duration::hours(-2))
        .unwrap();

    let (status, body) = app
        .send(Method::GET, &format!("/api/socket?token={expired}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);

    let (status, body) = app
        .send(Method::GET, "/api/socket", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);

    user::update(
        &app.state.pool,
        ana.id,
        user::UserChanges {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let (status, body) = app
        .send(Method::GET, &format!("/api/socket?token={token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1007);
}

fn location(response: &http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn login_callback_redirects_to_the_frontend() {
    let app = spawn_app().await;

    let start = app.raw(Method::GET, "/auth/google", None, None).await;
    assert!(start.status().is_redirection());
    assert!(location(&start).starts_with("https://id.test/authorize"));

    let ok = app
        .raw(Method::GET, "/auth/google/callback?code=good", None, None)
        .await;
    assert!(ok.status().is_redirection());
    let target = location(&ok);
    let token = target
        .strip_prefix("http://localhost:5173/callback?token=")
        .expect("token redirect");

    // first login provisions an active operator
    let (status, me) = app.get("/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "bia@bar.test");
    assert_eq!(me["user"]["role"], "operator");

    let denied = app
        .raw(Method::GET, "/auth/google/callback?error=access_denied", None, None)
        .await;
    assert_eq!(location(&denied), "http://localhost:5173?error=unauthorized");

    let unverified = app
        .raw(Method::GET, "/auth/google/callback?code=unverified", None, None)
        .await;
    assert_eq!(location(&unverified), "http://localhost:5173?error=unauthorized");

    let broken = app
        .raw(Method::GET, "/auth/google/callback?code=boom", None, None)
        .await;
    assert_eq!(location(&broken), "http://localhost:5173?error=server_error");
}

#[tokio::test]
async fn inactive_users_cannot_log_in() {
    let app = spawn_app().await;
    let (bia, _) = app.login_as("bia@bar.test", UserRole::Operator).await;
    user::update(
        &app.state.pool,
        bia.id,
        user::UserChanges {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = app
        .raw(Method::GET, "/auth/google/callback?code=good", None, None)
        .await;
    assert_eq!(location(&response), "http://localhost:5173?error=unauthorized");
}
