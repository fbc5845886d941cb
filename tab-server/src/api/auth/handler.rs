//! Authentication Handlers

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::User;

use crate::api::extract::ApiQuery;
use crate::auth::oauth::OAuthError;
use crate::auth::{CurrentUser, session};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;

/// Provider callback parameters
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Set by the provider when the user cancels or consent fails
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

fn frontend_redirect(state: &ServerState, path_and_query: &str) -> Redirect {
    let base = state.config.frontend_url.trim_end_matches('/');
    Redirect::to(&format!("{base}{path_and_query}"))
}

/// GET /auth/google - start the provider login
pub async fn google_login(State(state): State<ServerState>) -> AppResult<Redirect> {
    let url = state.identity.authorize_url().map_err(|e| {
        tracing::error!(error = %e, "Cannot start federated login");
        AppError::with_message(ErrorCode::OAuthFailed, e.to_string())
    })?;
    Ok(Redirect::to(&url))
}

/// GET /auth/google/callback - finish the login and hand the token to the frontend
pub async fn google_callback(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> Response {
    let code = match (query.code, query.error) {
        (Some(code), None) if !code.is_empty() => code,
        (_, error) => {
            security_log!("WARN", "oauth_denied", reason = error.unwrap_or_default());
            return frontend_redirect(&state, "?error=unauthorized").into_response();
        }
    };

    let identity = match state.identity.exchange_code(&code).await {
        Ok(identity) => identity,
        Err(OAuthError::Profile(reason)) => {
            security_log!("WARN", "oauth_profile_rejected", reason = reason);
            return frontend_redirect(&state, "?error=unauthorized").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth code exchange failed");
            return frontend_redirect(&state, "?error=server_error").into_response();
        }
    };

    match session::complete_login(&state.pool, &state.jwt_service, identity).await {
        Ok((_, token)) => {
            frontend_redirect(&state, &format!("/callback?token={token}")).into_response()
        }
        Err(e) if e.code == ErrorCode::AccountDisabled => {
            frontend_redirect(&state, "?error=unauthorized").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Login could not be completed");
            frontend_redirect(&state, "?error=server_error").into_response()
        }
    }
}

/// POST /auth/logout - tokens are stateless; the client discards its copy
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logged out. Discard the token on the client.",
    })
}

/// GET /auth/me - the logged-in user as stored
pub async fn me(State(state): State<ServerState>, current: CurrentUser) -> AppResult<Json<MeResponse>> {
    let user = user::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(MeResponse { user }))
}
