//! Authentication middleware
//!
//! `require_auth` validates the bearer token, reloads the user and inserts a
//! [`CurrentUser`] into the request extensions. `require_admin` must run
//! after it.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};

use crate::auth::{CurrentUser, JwtService, session};
use crate::core::ServerState;
use crate::security_log;

/// Require a logged-in, active user
///
/// | failure | status |
/// |---------|--------|
/// | no Authorization header | 401 |
/// | malformed / mis-signed token | 401 |
/// | expired token | 401 |
/// | user deleted or deactivated | 401 |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS preflight
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    let user = session::authenticate(&state.pool, &state.jwt_service, token).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Require the admin role (403 otherwise)
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::unauthorized)?;

    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id,
            email = user.email.clone(),
            uri = format!("{:?}", req.uri())
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}
