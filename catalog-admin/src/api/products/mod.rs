//! Product API Module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// Product router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/",
            get(handler::list)
                .post(handler::create)
                .delete(handler::delete_all),
        )
        .route("/import", post(handler::import))
        .route("/{id}", put(handler::update).delete(handler::delete))
}
