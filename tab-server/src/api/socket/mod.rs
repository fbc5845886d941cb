//! Realtime feed upgrade
//!
//! `GET /api/socket?token=<jwt>` (or `Authorization: Bearer`). The token is
//! checked before the upgrade headers so refused clients get a plain 401;
//! the open session keeps re-checking it.

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::rejection::WebSocketUpgradeRejection,
    },
    http::HeaderMap,
    response::Response,
    routing::get,
};
use serde::Deserialize;
use shared::error::{AppError, AppResult, ErrorCode};

use crate::api::extract::ApiQuery;
use crate::auth::JwtService;
use crate::core::ServerState;
use crate::live::{LiveCredential, run_session};
use crate::security_log;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/socket", get(upgrade))
}

#[derive(Debug, Default, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_from_header)
}

/// GET /api/socket
async fn upgrade(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<SocketQuery>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> AppResult<Response> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| bearer(&headers))
        .ok_or_else(|| {
            security_log!("WARN", "socket_auth_missing", uri = "/api/socket");
            AppError::unauthorized()
        })?;

    let (credential, user) = LiveCredential::authenticate(
        state.pool.clone(),
        state.jwt_service.clone(),
        token.to_string(),
    )
    .await?;
    let ws = ws.map_err(|e| AppError::with_message(ErrorCode::InvalidRequest, e.body_text()))?;

    let hub = state.live.clone();
    let shutdown = state.shutdown.clone();
    Ok(ws.on_upgrade(move |socket| run_session(socket, hub, credential, user, shutdown)))
}
