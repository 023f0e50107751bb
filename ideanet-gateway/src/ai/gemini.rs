//! Gemini API client
//!
//! Thin REST client over `generateContent` for the two prompts the
//! gateway sends: breaking a goal into starter steps and scoring
//! pairwise relatedness between ideas. Model output is markdown-prone,
//! so replies are stripped of code fences and, for steps, rescued from
//! surrounding prose by slicing out the first bracketed array.

use ideanet_core::SimilarityPair;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::types::{GatewayError, Result};

/// Canned starter steps used when the model answers with valid JSON
/// that is not an array of steps.
const FALLBACK_STEPS: [&str; 3] = [
    "Break it down and start with the first small action.",
    "Set a 5-minute timer.",
    "Celebrate when done.",
];

const MAX_STEPS: usize = 3;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    http_client: reqwest::Client,
}

// Response shape for generateContent, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("ideanet-gateway/0.1")
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a prompt and return the concatenated candidate text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .map_err(|e| GatewayError::Ai(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Ai(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Ai(format!("Invalid Gemini response: {}", e)))?;

        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GatewayError::Ai("Gemini response contained no text".into()));
        }

        debug!(chars = text.len(), "Gemini reply received");
        Ok(text)
    }

    /// Break a goal into at most 3 tiny starting steps.
    pub async fn suggest_steps(&self, goal: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "Goal: {}.\n\
             As a productivity assistant, break this goal into 3 tiny, actionable starting steps.\n\
             Return ONLY a valid JSON array of 3 strings, no other text.\n\
             Example: [\"Step 1\", \"Step 2\", \"Step 3\"]",
            goal.trim()
        );

        let raw = self.generate(&prompt).await?;
        parse_steps(&raw)
    }

    /// Score which idea pairs are meaningfully related.
    pub async fn score_pairs(&self, ideas: &[String]) -> Result<Vec<SimilarityPair>> {
        let goals = serde_json::to_string(ideas)
            .map_err(|e| GatewayError::Ai(format!("Failed to encode ideas: {}", e)))?;
        let prompt = format!(
            "You are a productivity assistant. Given these goals/ideas, identify which pairs \
             are meaningfully related (e.g., same domain, can be done together, one enables \
             the other).\nGoals: {}\n\n\
             Return ONLY a valid JSON array of objects. \
             Each object: {{ \"i\": number, \"j\": number, \"score\": number }}\n\
             Example: [{{\"i\":0,\"j\":1,\"score\":0.9}},{{\"i\":1,\"j\":2,\"score\":0.75}}]",
            goals
        );

        let raw = self.generate(&prompt).await?;
        parse_pairs(&raw)
    }
}

/// Remove markdown code fences the model loves to wrap JSON in.
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// First `[...]` slice of the text, for arrays embedded in prose.
fn bracket_slice(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_steps(raw: &str) -> Result<Vec<String>> {
    let cleaned = strip_code_fences(raw);

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(parse_err) => bracket_slice(&cleaned)
            .and_then(|slice| serde_json::from_str(slice).ok())
            .ok_or_else(|| {
                GatewayError::Ai(format!("Unparseable steps payload: {}", parse_err))
            })?,
    };

    // Valid JSON that is not an array falls back to the canned steps.
    let steps = match value {
        Value::Array(items) => items
            .into_iter()
            .take(MAX_STEPS)
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => FALLBACK_STEPS.iter().map(|s| s.to_string()).collect(),
    };

    Ok(steps)
}

fn parse_pairs(raw: &str) -> Result<Vec<SimilarityPair>> {
    let cleaned = strip_code_fences(raw);

    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| GatewayError::Ai(format!("Unparseable similarity payload: {}", e)))?;

    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| GatewayError::Ai(format!("Malformed similarity pairs: {}", e))),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_is_stripped() {
        let raw = "```json\n[\"a\", \"b\", \"c\"]\n```";
        assert_eq!(strip_code_fences(raw), "[\"a\", \"b\", \"c\"]");
    }

    #[test]
    fn steps_parse_from_clean_array() {
        let steps = parse_steps(r#"["lace up", "stretch", "run"]"#).unwrap();
        assert_eq!(steps, vec!["lace up", "stretch", "run"]);
    }

    #[test]
    fn steps_truncate_to_three() {
        let steps = parse_steps(r#"["a", "b", "c", "d", "e"]"#).unwrap();
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn steps_rescue_array_embedded_in_prose() {
        let raw = "Here you go:\n[\"lace up\", \"stretch\", \"run\"]\nGood luck!";
        let steps = parse_steps(raw).unwrap();
        assert_eq!(steps, vec!["lace up", "stretch", "run"]);
    }

    #[test]
    fn non_array_json_falls_back_to_canned_steps() {
        let steps = parse_steps(r#"{"steps": "sorry"}"#).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], FALLBACK_STEPS[0]);
    }

    #[test]
    fn unparseable_steps_payload_is_an_error() {
        assert!(parse_steps("I cannot help with that.").is_err());
    }

    #[test]
    fn non_string_steps_are_stringified() {
        let steps = parse_steps(r#"[1, true, "run"]"#).unwrap();
        assert_eq!(steps, vec!["1", "true", "run"]);
    }

    #[test]
    fn pairs_parse_from_fenced_array() {
        let raw = "```json\n[{\"i\":0,\"j\":1,\"score\":0.9}]\n```";
        let pairs = parse_pairs(raw).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].i, pairs[0].j), (0, 1));
        assert_eq!(pairs[0].score, 0.9);
    }

    #[test]
    fn non_array_pairs_payload_is_empty() {
        assert!(parse_pairs(r#"{"similarities": []}"#).unwrap().is_empty());
    }

    #[test]
    fn unparseable_pairs_payload_is_an_error() {
        assert!(parse_pairs("no related goals").is_err());
    }
}
