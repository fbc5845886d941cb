//! Authentication routes
//!
//! | path | method | auth |
//! |------|--------|------|
//! | /auth/google | GET | none; redirects to the provider |
//! | /auth/google/callback | GET | none; redirects to the frontend |
//! | /auth/logout | POST | none |
//! | /auth/me | GET | bearer |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Login flow routes (no token yet)
pub fn public_router() -> Router<ServerState> {
    Router::new()
        .route("/auth/google", get(handler::google_login))
        .route("/auth/google/callback", get(handler::google_callback))
        .route("/auth/logout", post(handler::logout))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<ServerState> {
    Router::new().route("/auth/me", get(handler::me))
}
