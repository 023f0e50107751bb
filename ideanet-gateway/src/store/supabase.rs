//! Supabase-backed idea node store
//!
//! Talks to the PostgREST endpoint (`/rest/v1/nodes`) with the project
//! API key. Writes ask for `return=representation` so the created or
//! updated row comes back in the same round trip.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{IdeaNode, NodeStore, STATUS_ACTIVE};
use crate::types::{GatewayError, Result};

/// Raw PostgREST row. `steps` can be SQL NULL for rows created outside
/// the gateway, so it is decoded as an option and defaulted.
#[derive(Debug, Deserialize)]
struct NodeRow {
    id: i64,
    text: String,
    status: String,
    #[serde(default)]
    steps: Option<Vec<String>>,
}

impl From<NodeRow> for IdeaNode {
    fn from(row: NodeRow) -> Self {
        IdeaNode {
            id: row.id,
            text: row.text,
            status: row.status,
            steps: row.steps.unwrap_or_default(),
        }
    }
}

pub struct SupabaseStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, request_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent("ideanet-gateway/0.1")
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn nodes_url(&self) -> String {
        format!("{}/rest/v1/nodes", self.base_url)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Send a request and surface non-2xx responses as store errors with
    /// the PostgREST body attached (it carries the useful detail).
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| GatewayError::Store(format!("Supabase request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Store(format!(
                "Supabase returned {}: {}",
                status, body
            )));
        }

        Ok(response)
    }

    async fn rows(&self, builder: reqwest::RequestBuilder) -> Result<Vec<IdeaNode>> {
        let rows: Vec<NodeRow> = self
            .send(builder)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Store(format!("Invalid Supabase response: {}", e)))?;
        Ok(rows.into_iter().map(IdeaNode::from).collect())
    }
}

#[async_trait]
impl NodeStore for SupabaseStore {
    async fn list(&self) -> Result<Vec<IdeaNode>> {
        let builder = self
            .http_client
            .get(self.nodes_url())
            .query(&[("select", "*")]);
        self.rows(builder).await
    }

    async fn list_active(&self) -> Result<Vec<IdeaNode>> {
        let builder = self
            .http_client
            .get(self.nodes_url())
            .query(&[("select", "*"), ("status", "eq.active")]);
        self.rows(builder).await
    }

    async fn insert(&self, text: &str) -> Result<IdeaNode> {
        debug!(text = %text, "Inserting idea node");
        let builder = self
            .http_client
            .post(self.nodes_url())
            .header("Prefer", "return=representation")
            .json(&json!([{ "text": text, "status": STATUS_ACTIVE, "steps": [] }]));

        self.rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Store("Supabase insert returned no row".into()))
    }

    async fn set_status(&self, id: i64, status: &str) -> Result<Option<IdeaNode>> {
        let builder = self
            .http_client
            .patch(self.nodes_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&json!({ "status": status }));

        // PostgREST returns an empty array when the filter matched nothing
        Ok(self.rows(builder).await?.into_iter().next())
    }

    async fn set_steps(&self, id: i64, steps: &[String]) -> Result<()> {
        let builder = self
            .http_client
            .patch(self.nodes_url())
            .query(&[("id", format!("eq.{}", id))])
            .json(&json!({ "steps": steps }));

        self.send(builder).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let store = SupabaseStore::new(
            "https://xyz.supabase.co/",
            "key",
            Duration::from_secs(5),
        );
        assert_eq!(store.nodes_url(), "https://xyz.supabase.co/rest/v1/nodes");
    }

    #[test]
    fn null_steps_decode_as_empty() {
        let row: NodeRow =
            serde_json::from_str(r#"{"id":7,"text":"run 5k","status":"active","steps":null}"#)
                .unwrap();
        let node = IdeaNode::from(row);
        assert_eq!(node.id, 7);
        assert!(node.steps.is_empty());
    }

    #[test]
    fn populated_steps_decode_in_order() {
        let row: NodeRow = serde_json::from_str(
            r#"{"id":7,"text":"run 5k","status":"active","steps":["a","b","c"]}"#,
        )
        .unwrap();
        assert_eq!(IdeaNode::from(row).steps, vec!["a", "b", "c"]);
    }
}
