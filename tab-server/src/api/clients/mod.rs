//! Client API
//!
//! Clients carry a derived credit balance; `/transactions` is their ledger.

mod handler;

pub(crate) use handler::publish_client_updated;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/clients", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route(
            "/{id}/transactions",
            get(handler::statement).post(handler::add_transaction),
        )
}
