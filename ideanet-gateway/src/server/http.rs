//! HTTP server implementation
//!
//! hyper http1 with TokioIo for async handling: an accept loop spawns a
//! task per connection and every request funnels through a single
//! `(Method, path)` match in `handle_request`.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::ai::GeminiClient;
use crate::config::Args;
use crate::routes;
use crate::routes::BoxBody;
use crate::store::{Ledger, MemoryLedger, MemoryStore, NodeStore};
use crate::types::GatewayError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Contract and balance ledger (serializes balance mutation)
    pub ledger: Arc<dyn Ledger>,
    /// Idea node store (Supabase in production, in-memory in dev mode)
    pub nodes: Arc<dyn NodeStore>,
    /// Remote scorer/synthesizer; absent in dev mode without an API key
    pub ai: Option<Arc<GeminiClient>>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create AppState with in-memory everything (dev mode, tests)
    pub fn new(args: Args) -> Self {
        let ledger = MemoryLedger::new(args.starting_balance, args.default_stake);
        Self {
            args,
            ledger: Arc::new(ledger),
            nodes: Arc::new(MemoryStore::new()),
            ai: None,
            started_at: Instant::now(),
        }
    }

    /// Create AppState with injected collaborators
    pub fn with_services(
        args: Args,
        ledger: Arc<dyn Ledger>,
        nodes: Arc<dyn NodeStore>,
        ai: Option<Arc<GeminiClient>>,
    ) -> Self {
        Self {
            args,
            ledger,
            nodes,
            ai,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "IdeaNet gateway listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - external collaborators are optional");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // Browser clients hit every route cross-origin
    if method == Method::OPTIONS {
        return Ok(routes::cors_preflight());
    }

    // PATCH /api/nodes/{id} carries a path parameter; peel it off before
    // the static match
    if method == Method::PATCH {
        if let Some(id) = path.strip_prefix("/api/nodes/") {
            if !id.is_empty() && !id.contains('/') {
                return Ok(routes::handle_update_status(req, state, id).await);
            }
        }
        return Ok(routes::not_found_response(&path));
    }

    let response = match (method, path.as_str()) {
        // Liveness probe - returns 200 if the gateway is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Readiness probe - 200 only when collaborators are wired up
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // Accountability contracts
        (Method::POST, "/api/setup") => routes::handle_setup(req, state).await,
        (Method::POST, "/api/evaluate") => routes::handle_evaluate(req, state).await,

        // Idea nodes
        (Method::GET, "/api/nodes") => routes::handle_list_nodes(state).await,
        (Method::POST, "/api/nodes") => routes::handle_create_node(req, state).await,

        // AI-assisted scoring and step synthesis
        (Method::POST, "/api/similarity") => routes::handle_similarity(req, state).await,
        (Method::POST, "/api/synthesize") => routes::handle_synthesize(req, state).await,

        _ => routes::not_found_response(&path),
    };

    Ok(response)
}
