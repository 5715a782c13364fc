//! Commands Layer
//!
//! HTTP handlers that bridge API clients to the match registry.

mod error;
mod gate;
mod match_cmd;

pub use error::ApiError;
pub use gate::AdminClaims;
pub use match_cmd::*;

use axum::routing::{delete, get};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

fn match_routes() -> Router<AppState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/{id}", delete(delete_match))
}

async fn health() -> &'static str {
    "ok"
}

/// Full application router. Match routes are served both at the root and
/// under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(match_routes())
        .nest("/api", match_routes())
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests;
