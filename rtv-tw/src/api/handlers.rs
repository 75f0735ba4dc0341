//! Request handlers for the tree API

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use rtv_common::Error;

use super::AppState;
use crate::worker::TreePayload;

/// Body of POST /tree/load
#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    /// Source URL of the compressed tree payload
    pub url: String,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(e: Error) -> ApiError {
    let status = match e {
        Error::StoreNotReady => StatusCode::CONFLICT,
        Error::NodeNotFound(_) => StatusCode::NOT_FOUND,
        Error::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

/// POST /api/v1/tree/load: run the load pipeline and return the terminal
/// payload
///
/// Progress and status stream on /events while this request is in flight.
pub async fn load_tree(
    State(state): State<AppState>,
    Json(req): Json<LoadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!("Load requested for {}", req.url);
    match state.worker.fetch_tree(req.url).await {
        Ok(TreePayload::Flattened(tree)) => Ok(Json(json!({ "flattenedTree": tree }))),
        Ok(TreePayload::Processed(tree)) => Ok(Json(json!({ "processedTree": tree }))),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /api/v1/tree/:node_id/children: cutoff-surviving children of a
/// node, lazily chain-merged
pub async fn get_children(
    State(state): State<AppState>,
    Path(node_id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.worker.get_children(node_id).await {
        Ok(reply) => Ok(Json(json!({
            "action": "childrenFetched",
            "nodeId": reply.node_id,
            "node": reply.node,
            "children": reply.children,
        }))),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /api/v1/events: SSE bridge of the worker event bus
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to tree events");
    let mut rx = state.worker.subscribe_events();

    let stream = async_stream::stream! {
        // Send initial connected status
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(data) => yield Ok(Event::default().event("TreeEvent").data(data)),
                    Err(e) => warn!("Failed to serialize tree event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE client lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
