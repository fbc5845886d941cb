//! Test harness: in-memory app driven through `tower::ServiceExt::oneshot`

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use shared::models::{User, UserRole};
use std::sync::Arc;
use tab_server::auth::oauth::{FederatedIdentity, IdentityProvider, OAuthError};
use tab_server::db::DbService;
use tab_server::db::repository::user;
use tab_server::{Config, ServerState};
use tower::ServiceExt;

/// Provider that accepts the code `good` and fails everything else
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorize_url(&self) -> Result<String, OAuthError> {
        Ok("https://id.test/authorize?client_id=test".into())
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, OAuthError> {
        match code {
            "good" => Ok(FederatedIdentity {
                subject: "g-123".into(),
                email: "bia@bar.test".into(),
                name: "Bia".into(),
                avatar_url: None,
            }),
            "unverified" => Err(OAuthError::Profile("missing or unverified email".into())),
            other => Err(OAuthError::Exchange(format!("rejected code {other}"))),
        }
    }
}

pub struct TestApp {
    pub state: ServerState,
    pub app: Router,
}

pub async fn spawn_app() -> TestApp {
    let config = Config::default();
    let db = DbService::connect(&config.database_url).await.unwrap();
    let state = ServerState::new(config, db.pool, Arc::new(FakeIdentity));
    let app = tab_server::api::build_app(state.clone());
    TestApp { state, app }
}

impl TestApp {
    /// Create a user and return it with a fresh token
    pub async fn login_as(&self, email: &str, role: UserRole) -> (User, String) {
        let created = user::create(
            &self.state.pool,
            user::NewUser {
                email: email.into(),
                name: email.split('@').next().unwrap().into(),
                role,
            },
        )
        .await
        .unwrap();
        let token = self.state.jwt_service.generate_token(&created).unwrap();
        (created, token)
    }

    pub async fn operator(&self) -> String {
        self.login_as("op@bar.test", UserRole::Operator).await.1
    }

    pub async fn admin(&self) -> String {
        self.login_as("boss@bar.test", UserRole::Admin).await.1
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> http::Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}
