//! Similarity scoring endpoint
//!
//! POST /api/similarity - rank which idea pairs are related.
//!
//! The remote AI scorer is asked first; a reply with at least one pair
//! is used verbatim. A scorer error or an empty reply falls back to the
//! local Jaccard estimator. Note the conflation: a legitimately-empty
//! remote verdict ("nothing is related") is indistinguishable from
//! "scorer unavailable" and also triggers the fallback.

use hyper::{Request, Response, StatusCode};
use ideanet_core::{estimate_similarities, SimilarityPair};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{error_response, json_response, parse_json_body, BoxBody};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SimilarityRequest {
    /// Decoded leniently: anything other than an array of texts counts
    /// as no ideas, so a malformed field still answers
    /// `{"similarities": []}` with 200 rather than a 400.
    #[serde(default, deserialize_with = "lenient_ideas")]
    pub ideas: Vec<String>,
}

fn lenient_ideas<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub similarities: Vec<SimilarityPair>,
}

/// POST /api/similarity
pub async fn handle_similarity(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: SimilarityRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if body.ideas.len() < 2 {
        return json_response(
            StatusCode::OK,
            &SimilarityResponse {
                similarities: Vec::new(),
            },
        );
    }

    let similarities = score_or_fallback(&state, &body.ideas).await;
    json_response(StatusCode::OK, &SimilarityResponse { similarities })
}

async fn score_or_fallback(state: &AppState, ideas: &[String]) -> Vec<SimilarityPair> {
    if let Some(ai) = &state.ai {
        match ai.score_pairs(ideas).await {
            Ok(pairs) if !pairs.is_empty() => {
                debug!(pairs = pairs.len(), "Remote similarity scores used");
                return pairs;
            }
            Ok(_) => {
                debug!("Remote scorer returned no pairs, using local estimator");
            }
            Err(e) => {
                warn!("Similarity scoring failed, using local estimator: {}", e);
            }
        }
    }

    estimate_similarities(ideas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GeminiClient, GeminiConfig};
    use crate::config::Args;
    use crate::store::{MemoryLedger, MemoryStore};
    use clap::Parser;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_state(ai: Option<Arc<GeminiClient>>) -> AppState {
        AppState::with_services(
            Args::parse_from(["ideanet-gateway"]),
            Arc::new(MemoryLedger::default()),
            Arc::new(MemoryStore::new()),
            ai,
        )
    }

    fn scorer(base_url: String) -> Arc<GeminiClient> {
        Arc::new(GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            base_url,
            request_timeout: Duration::from_secs(2),
            ..GeminiConfig::default()
        }))
    }

    /// One-shot HTTP stub that answers a single request with `body`.
    async fn spawn_stub(body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
        });
        format!("http://{}", addr)
    }

    /// Drain the request (headers plus content-length body) before
    /// answering, so the client never sees a close mid-send.
    async fn read_request(stream: &mut tokio::net::TcpStream) {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            data.extend_from_slice(&buf[..n]);
            let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let body_len = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    #[tokio::test]
    async fn no_scorer_uses_local_estimates() {
        let state = test_state(None);
        let ideas = vec!["run 5k".to_string(), "run a mile".to_string()];
        let pairs = score_or_fallback(&state, &ideas).await;
        assert_eq!(pairs, estimate_similarities(&ideas));
        assert_eq!(pairs[0].score, 0.25);
    }

    #[tokio::test]
    async fn scorer_error_falls_back_to_local_estimates() {
        // nothing listens on this port, so the request fails fast
        let state = test_state(Some(scorer("http://127.0.0.1:1".to_string())));
        let ideas = vec!["run 5k".to_string(), "run a mile".to_string()];
        let pairs = score_or_fallback(&state, &ideas).await;
        assert_eq!(pairs, estimate_similarities(&ideas));
    }

    #[tokio::test]
    async fn scorer_empty_reply_falls_back_to_local_estimates() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[]"}]}}]}"#;
        let state = test_state(Some(scorer(spawn_stub(body).await)));
        let ideas = vec!["run 5k".to_string(), "run a mile".to_string()];
        let pairs = score_or_fallback(&state, &ideas).await;
        assert_eq!(pairs, estimate_similarities(&ideas));
    }

    #[tokio::test]
    async fn scorer_pairs_pass_through_verbatim() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[{\"i\":0,\"j\":1,\"score\":0.9}]"}]}}]}"#;
        let state = test_state(Some(scorer(spawn_stub(body).await)));

        // these two share no tokens, so 0.9 can only come from the scorer
        let ideas = vec!["run 5k".to_string(), "read a book".to_string()];
        let pairs = score_or_fallback(&state, &ideas).await;
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].i, pairs[0].j), (0, 1));
        assert_eq!(pairs[0].score, 0.9);
    }

    #[test]
    fn non_array_ideas_decode_as_empty() {
        let body: SimilarityRequest = serde_json::from_str(r#"{"ideas":"x"}"#).unwrap();
        assert!(body.ideas.is_empty());

        let body: SimilarityRequest = serde_json::from_str("{}").unwrap();
        assert!(body.ideas.is_empty());
    }

    #[test]
    fn non_string_ideas_are_stringified() {
        let body: SimilarityRequest = serde_json::from_str(r#"{"ideas":["a",1]}"#).unwrap();
        assert_eq!(body.ideas, vec!["a", "1"]);
    }
}
