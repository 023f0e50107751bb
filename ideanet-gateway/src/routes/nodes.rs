//! Idea node endpoints
//!
//! - GET   /api/nodes      - list all nodes
//! - POST  /api/nodes      - create a node
//! - PATCH /api/nodes/{id} - update a node's status
//!
//! Thin proxies over the injected `NodeStore`; store failures surface
//! as 400 with the store's error text passed through.

use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::{error_response, json_response, parse_json_body, BoxBody};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// GET /api/nodes
pub async fn handle_list_nodes(state: Arc<AppState>) -> Response<BoxBody> {
    match state.nodes.list().await {
        Ok(nodes) => json_response(StatusCode::OK, &nodes),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// POST /api/nodes
pub async fn handle_create_node(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: CreateNodeRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let text = body.text.trim();
    if text.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text required");
    }

    match state.nodes.insert(text).await {
        Ok(node) => {
            info!(id = node.id, "Idea node created");
            json_response(StatusCode::CREATED, &node)
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// PATCH /api/nodes/{id}
pub async fn handle_update_status(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let id: i64 = match id.parse() {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid node id"),
    };

    let body: UpdateStatusRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if body.status.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "status required");
    }

    match state.nodes.set_status(id, &body.status).await {
        // Unknown id answers with an empty object, not a 404
        Ok(Some(node)) => json_response(StatusCode::OK, &node),
        Ok(None) => json_response(StatusCode::OK, &json!({})),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}
