//! IdeaNet gateway - accountability contract backend
//!
//! HTTP gateway for the IdeaNet demo: two users pledge a daily goal
//! with money at stake, dump ideas into a shared board, and let a
//! generative AI collaborator suggest starter steps and relatedness
//! links between ideas.
//!
//! ## Services
//!
//! - **Contracts**: pair setup and goal-completion settlement, with the
//!   stake-transfer arithmetic in the `ideanet-core` crate
//! - **Nodes**: idea/goal CRUD proxied to a PostgREST-compatible store
//! - **Similarity**: remote AI scoring with a local Jaccard fallback
//! - **Synthesis**: per-goal and batch step generation via Gemini

pub mod ai;
pub mod config;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
