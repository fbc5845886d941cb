//! Tab API
//!
//! | path | method |
//! |------|--------|
//! | /api/tabs | GET, POST |
//! | /api/tabs/history | GET |
//! | /api/tabs/{id} | GET, PUT, DELETE |
//! | /api/tabs/{id}/items | POST |
//! | /api/tabs/{id}/items/{item_id} | PUT, DELETE |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tabs", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        // before /{id} so "history" is not read as an id
        .route("/history", get(handler::history))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/items", post(handler::add_item))
        .route(
            "/{id}/items/{item_id}",
            put(handler::update_item).delete(handler::remove_item),
        )
}
