//! Health check endpoints
//!
//! Kubernetes-style probes:
//! - /health, /healthz - liveness (is the gateway running?)
//! - /ready, /readyz   - readiness (are the collaborators wired up?)
//!
//! Liveness always returns 200. Readiness returns 200 when the node
//! store and AI scorer are configured, or unconditionally in dev mode
//! (where the in-memory store and local similarity fallback cover for
//! them).

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use super::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
    /// Seconds since the gateway started
    pub uptime: u64,
    pub timestamp: String,
    pub mode: String,
    pub node_id: String,
    pub store: StoreHealth,
    pub ai: AiHealth,
}

/// Idea node store status
#[derive(Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub configured: bool,
}

/// Generative AI collaborator status
#[derive(Serialize)]
pub struct AiHealth {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let args = &state.args;

    let ai_configured = state.ai.is_some();
    let store_configured = args.supabase_configured();

    // Degraded: running, but a collaborator is missing outside dev mode
    let status = if args.dev_mode || (store_configured && ai_configured) {
        "online"
    } else {
        "degraded"
    };

    HealthResponse {
        healthy: true,
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: args.node_id.to_string(),
        store: StoreHealth {
            backend: state.nodes.backend(),
            configured: store_configured,
        },
        ai: AiHealth {
            configured: ai_configured,
            model: state.ai.as_ref().map(|ai| ai.model().to_string()),
        },
    }
}

/// Handle liveness probe (/health, /healthz)
pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    let response = build_health_response(&state);
    json_response(StatusCode::OK, &response)
}

/// Handle readiness probe (/ready, /readyz)
pub fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    let response = build_health_response(&state);

    let is_ready = state.args.dev_mode || response.status == "online";
    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json_response(status, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            service: "ideanet-gateway",
        },
    )
}
