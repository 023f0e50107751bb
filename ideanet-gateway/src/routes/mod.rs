//! HTTP routes for the IdeaNet gateway

pub mod contracts;
pub mod health;
pub mod nodes;
pub mod similarity;
pub mod synthesize;

pub use contracts::{handle_evaluate, handle_setup};
pub use health::{health_check, readiness_check, version_info};
pub use nodes::{handle_create_node, handle_list_nodes, handle_update_status};
pub use similarity::handle_similarity;
pub use synthesize::handle_synthesize;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::types::GatewayError;

pub(crate) type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Uniform `{"error": "..."}` body for client errors.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

// =============================================================================
// Response Helpers
// =============================================================================

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorBody {
            error: message.into(),
        },
    )
}

pub(crate) fn not_found_response(path: &str) -> Response<BoxBody> {
    error_response(StatusCode::NOT_FOUND, format!("No route for {}", path))
}

pub(crate) fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

// =============================================================================
// Body Parsing
// =============================================================================

const MAX_BODY_BYTES: usize = 65536;

pub(crate) async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, GatewayError> {
    let body = req
        .collect()
        .await
        .map_err(|e| GatewayError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(GatewayError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Http(format!("Invalid JSON: {}", e)))
}

/// Like `parse_json_body`, but an absent or empty body decodes as the
/// type's default (for endpoints where the body itself is optional).
pub(crate) async fn parse_json_body_or_default<T>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, GatewayError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    let body = req
        .collect()
        .await
        .map_err(|e| GatewayError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.is_empty() {
        return Ok(T::default());
    }
    if bytes.len() > MAX_BODY_BYTES {
        return Err(GatewayError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Http(format!("Invalid JSON: {}", e)))
}
