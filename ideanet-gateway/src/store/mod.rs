//! Storage seams for the gateway
//!
//! Two stores back the API: the contract/balance ledger (in-memory for
//! this demo) and the idea/goal node store (PostgREST-backed, with an
//! in-memory stand-in for dev mode). Both are traits injected into the
//! request handlers.

pub mod ledger;
pub mod memory;
pub mod supabase;

pub use ledger::{Contract, Ledger, MemoryLedger, UserAccount, DEFAULT_GOAL_COUNT, DEFAULT_STAKE};
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Result;

/// Status of a freshly created idea node.
pub const STATUS_ACTIVE: &str = "active";

/// A user-submitted idea/goal with its AI-suggested steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaNode {
    pub id: i64,
    pub text: String,
    pub status: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Storage seam for idea nodes.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// All nodes, regardless of status.
    async fn list(&self) -> Result<Vec<IdeaNode>>;

    /// Nodes with status `active` (batch synthesis targets).
    async fn list_active(&self) -> Result<Vec<IdeaNode>>;

    /// Create a node with status `active` and no steps.
    async fn insert(&self, text: &str) -> Result<IdeaNode>;

    /// Update a node's status, returning the updated node if it exists.
    async fn set_status(&self, id: i64, status: &str) -> Result<Option<IdeaNode>>;

    /// Replace a node's suggested steps.
    async fn set_steps(&self, id: i64, steps: &[String]) -> Result<()>;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}
