//! IdeaNet gateway - accountability contract backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideanet_gateway::{
    ai::{GeminiClient, GeminiConfig},
    config::Args,
    server,
    store::{Ledger, MemoryLedger, MemoryStore, NodeStore, SupabaseStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ideanet_gateway={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  IdeaNet Gateway");
    info!("  Think. Connect. Act.");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Gemini model: {}", args.gemini_model);
    info!("Starting balance: {}", args.starting_balance);
    info!("======================================");

    // Idea node store: Supabase when configured, in-memory in dev mode.
    // validate() already requires Supabase outside dev mode.
    let nodes: Arc<dyn NodeStore> = match (&args.supabase_url, &args.supabase_key) {
        (Some(url), Some(key)) if args.supabase_configured() => {
            info!("Supabase node store configured ({})", url);
            Arc::new(SupabaseStore::new(url, key, args.request_timeout()))
        }
        _ => {
            warn!("Supabase not configured (dev mode, using in-memory node store)");
            Arc::new(MemoryStore::new())
        }
    };

    // Gemini client for step synthesis and similarity scoring
    let ai = match &args.gemini_api_key {
        Some(key) if args.gemini_configured() => {
            info!("Gemini client configured (model: {})", args.gemini_model);
            Some(Arc::new(GeminiClient::new(GeminiConfig {
                api_key: key.clone(),
                model: args.gemini_model.clone(),
                base_url: args.gemini_base_url.clone(),
                request_timeout: args.request_timeout(),
            })))
        }
        _ => {
            warn!("GEMINI_API_KEY not set (dev mode, step synthesis disabled, similarity uses local estimator)");
            None
        }
    };

    // Contract/balance ledger - in-memory for the demo, injected so
    // handlers never touch a process-wide singleton
    let ledger: Arc<dyn Ledger> =
        Arc::new(MemoryLedger::new(args.starting_balance, args.default_stake));

    let state = Arc::new(server::AppState::with_services(
        args.clone(),
        ledger,
        nodes,
        ai,
    ));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
