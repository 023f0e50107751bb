//! In-memory idea node store
//!
//! Dev-mode stand-in used when Supabase is not configured, so the
//! gateway still serves the full API against process-local state.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{IdeaNode, NodeStore, STATUS_ACTIVE};
use crate::types::Result;

pub struct MemoryStore {
    nodes: DashMap<i64, IdeaNode>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    fn sorted(&self, mut nodes: Vec<IdeaNode>) -> Vec<IdeaNode> {
        nodes.sort_by_key(|n| n.id);
        nodes
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn list(&self) -> Result<Vec<IdeaNode>> {
        let nodes = self.nodes.iter().map(|e| e.value().clone()).collect();
        Ok(self.sorted(nodes))
    }

    async fn list_active(&self) -> Result<Vec<IdeaNode>> {
        let nodes = self
            .nodes
            .iter()
            .filter(|e| e.value().status == STATUS_ACTIVE)
            .map(|e| e.value().clone())
            .collect();
        Ok(self.sorted(nodes))
    }

    async fn insert(&self, text: &str) -> Result<IdeaNode> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let node = IdeaNode {
            id,
            text: text.to_string(),
            status: STATUS_ACTIVE.to_string(),
            steps: Vec::new(),
        };
        self.nodes.insert(id, node.clone());
        Ok(node)
    }

    async fn set_status(&self, id: i64, status: &str) -> Result<Option<IdeaNode>> {
        Ok(self.nodes.get_mut(&id).map(|mut entry| {
            entry.status = status.to_string();
            entry.clone()
        }))
    }

    async fn set_steps(&self, id: i64, steps: &[String]) -> Result<()> {
        if let Some(mut entry) = self.nodes.get_mut(&id) {
            entry.steps = steps.to_vec();
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
