//! Step synthesis endpoint
//!
//! POST /api/synthesize - two modes, selected by the request body:
//!
//! - `{"text": "..."}` breaks that one goal into starter steps and
//!   returns them without persisting anything.
//! - an empty body (or no `text`) runs the batch pass: every active
//!   node still missing steps gets them generated and written back to
//!   the store. Individual node failures are logged and skipped.

use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{error_response, json_response, parse_json_body_or_default, BoxBody};
use crate::server::AppState;
use crate::store::IdeaNode;

/// Placeholder steps from an earlier seeding pass; nodes still carrying
/// them are re-synthesized.
const LEGACY_PLACEHOLDER_STEP: &str = "Step 1: Open project";

#[derive(Debug, Default, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StepsResponse {
    pub steps: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub message: String,
}

/// POST /api/synthesize
pub async fn handle_synthesize(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: SynthesizeRequest = match parse_json_body_or_default(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match body.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => synthesize_single(&state, text).await,
        _ => synthesize_batch(&state).await,
    }
}

async fn synthesize_single(state: &AppState, text: &str) -> Response<BoxBody> {
    let Some(ai) = &state.ai else {
        warn!("Synthesis requested but no AI client is configured");
        return failed_steps_response();
    };

    match ai.suggest_steps(text).await {
        Ok(steps) => json_response(StatusCode::OK, &StepsResponse { steps }),
        Err(e) => {
            error!("Step synthesis failed: {}", e);
            failed_steps_response()
        }
    }
}

async fn synthesize_batch(state: &AppState) -> Response<BoxBody> {
    let active = match state.nodes.list_active().await {
        Ok(nodes) => nodes,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let candidates: Vec<&IdeaNode> = active.iter().filter(|n| needs_steps(n)).collect();

    match &state.ai {
        Some(ai) => {
            let mut synthesized = 0usize;
            for node in &candidates {
                match ai.suggest_steps(&node.text).await {
                    Ok(steps) => {
                        if let Err(e) = state.nodes.set_steps(node.id, &steps).await {
                            warn!(id = node.id, "Failed to persist synthesized steps: {}", e);
                        } else {
                            synthesized += 1;
                        }
                    }
                    Err(e) => {
                        error!(id = node.id, "Step synthesis failed: {}", e);
                    }
                }
            }
            info!(candidates = candidates.len(), synthesized, "Batch synthesis finished");
        }
        None if !candidates.is_empty() => {
            warn!("Batch synthesis skipped: no AI client configured");
        }
        None => {}
    }

    json_response(
        StatusCode::OK,
        &BatchResponse {
            message: "Gemini synthesis complete.".to_string(),
        },
    )
}

fn needs_steps(node: &IdeaNode) -> bool {
    node.steps.is_empty() || node.steps[0] == LEGACY_PLACEHOLDER_STEP
}

fn failed_steps_response() -> Response<BoxBody> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &StepsResponse {
            steps: vec!["Could not synthesize steps.".to_string()],
        },
    )
}
