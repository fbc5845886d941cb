//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness check (public)
//! - [`auth`] - federated login, logout, current user
//! - [`tabs`] - tabs and their items
//! - [`products`] / [`categories`] - catalog
//! - [`clients`] - credit clients and their ledger
//! - [`users`] - user administration (admin)
//! - [`socket`] - realtime feed upgrade
//!
//! Handlers publish to the live hub only after the service call committed.

pub mod auth;
pub mod categories;
pub mod clients;
pub mod extract;
pub mod health;
pub mod products;
pub mod socket;
pub mod tabs;
pub mod users;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue, Method};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{require_admin, require_auth};
use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// In-flight HTTP requests; open sockets do not hold a slot after the upgrade
const MAX_CONCURRENT_REQUESTS: usize = 256;

/// Random request id for every incoming request
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes with their auth layers, no state attached
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    let admin = users::router().route_layer(axum_middleware::from_fn(require_admin));

    let protected = Router::new()
        .merge(tabs::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(clients::router())
        .merge(auth::protected_router())
        .merge(admin)
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(health::router())
        .merge(auth::public_router())
        // authenticates before the upgrade, outside require_auth (token may be in the query)
        .merge(socket::router())
        .merge(protected)
}

/// Fully configured application: routes, middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router(&state)
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(true)
}
