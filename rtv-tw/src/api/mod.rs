//! HTTP + SSE surface for the rendering layer
//!
//! The rendering layer stays fully out of process; it drives the worker
//! through these endpoints and watches load progress on the event stream.

pub mod handlers;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::worker::WorkerHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the background tree worker
    pub worker: WorkerHandle,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Load pipeline
            .route("/tree/load", post(handlers::load_tree))

            // On-demand subtree queries
            .route("/tree/:node_id/children", get(handlers::get_children))

            // SSE events
            .route("/events", get(handlers::sse_handler))
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "rtv-tw",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
    }))
}
