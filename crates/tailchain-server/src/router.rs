use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all chain endpoints.
///
/// `get` also answers HEAD; other methods get 405.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::first_handler))
        .route("/next/", get(handler::first_handler))
        .route("/next/:cursor", get(handler::next_handler))
        .route("/:hash", get(handler::entry_handler))
        .fallback(handler::fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
