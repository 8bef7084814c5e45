//! Upstream text generation.
//!
//! [`TextGenerator`] is the seam between the tools and whatever model produces
//! the raw text. [`GeminiClient`] is the production implementation, calling the
//! Gemini `generateContent` REST endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Config;
use crate::state::CircuitBreaker;

/// Max characters of an upstream error body kept in the error message.
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no Gemini API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("circuit breaker open for provider '{provider}', retry in ~{retry_in_secs}s")]
    CircuitOpen { provider: String, retry_in_secs: u64 },

    #[error("Gemini API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Gemini API returned no text: {0}")]
    EmptyResponse(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` to the model and return its raw text reply.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Model identifier, for logs and health output.
    fn model(&self) -> &str;
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: Arc<Config>,
    circuit: Arc<CircuitBreaker>,
}

impl GeminiClient {
    pub fn new(config: Arc<Config>, circuit: Arc<CircuitBreaker>) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(config.request_timeout)
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()?;
        Ok(Self { http, config, circuit })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.config.api_base, self.config.model)
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_output_tokens
            }
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .gemini_api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;
        self.circuit.check()?;

        let started = std::time::Instant::now();
        let result = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(prompt))
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                self.circuit.record_failure();
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // 4xx other than rate limiting means our request is wrong, not that
            // the provider is down.
            if status.is_server_error() || status.as_u16() == 429 {
                self.circuit.record_failure();
            }
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_LIMIT),
            });
        }

        let body: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                self.circuit.record_failure();
                return Err(e.into());
            }
        };
        self.circuit.record_success();

        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "gemini: generateContent ok"
        );

        extract_text(&body).ok_or_else(|| {
            let diag = diagnose(&body);
            tracing::error!("gemini: response missing text ({})", diag);
            GenerationError::EmptyResponse(diag)
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Concatenated text parts of the first candidate. `None` when there is no
/// non-empty text to return.
pub fn extract_text(resp: &Value) -> Option<String> {
    let parts = resp.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

/// Human-readable reason a `generateContent` response carried no text.
pub fn diagnose(resp: &Value) -> String {
    let mut diag = Vec::new();

    if let Some(feedback) = resp.get("promptFeedback") {
        if let Some(reason) = feedback.get("blockReason").and_then(Value::as_str) {
            diag.push(format!("promptFeedback.blockReason={}", reason));
        }
    }

    match resp.get("candidates").and_then(Value::as_array) {
        None => diag.push("no candidates field".to_string()),
        Some(c) if c.is_empty() => diag.push("candidates array is empty".to_string()),
        Some(c) => {
            let c0 = &c[0];
            if let Some(reason) = c0.get("finishReason").and_then(Value::as_str) {
                diag.push(format!("finishReason={}", reason));
            }
            if let Some(ratings) = c0.get("safetyRatings").and_then(Value::as_array) {
                for r in ratings {
                    if let (Some(cat), Some(prob)) = (
                        r.get("category").and_then(Value::as_str),
                        r.get("probability").and_then(Value::as_str),
                    ) {
                        if prob != "NEGLIGIBLE" && prob != "LOW" {
                            diag.push(format!("safety: {}={}", cat, prob));
                        }
                    }
                }
            }
            if c0.get("content").is_none() {
                diag.push("candidate has no 'content' field".to_string());
            }
        }
    }

    if diag.is_empty() {
        "unknown reason".to_string()
    } else {
        diag.join(", ")
    }
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── extract_text ─────────────────────────────────────────────────────

    #[test]
    fn extract_text_joins_parts() {
        let resp = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": " 1}" }] } }]
        });
        assert_eq!(extract_text(&resp).as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_text_skips_thought_parts() {
        let resp = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "thinking...", "thought": true },
                { "text": "answer" }
            ] } }]
        });
        assert_eq!(extract_text(&resp).as_deref(), Some("answer"));
    }

    #[test]
    fn extract_text_none_when_blank() {
        let resp = json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] });
        assert!(extract_text(&resp).is_none());
        assert!(extract_text(&json!({})).is_none());
    }

    // ── diagnose ─────────────────────────────────────────────────────────

    #[test]
    fn diagnose_reports_block_reason() {
        let resp = json!({ "promptFeedback": { "blockReason": "SAFETY" }, "candidates": [] });
        let d = diagnose(&resp);
        assert!(d.contains("blockReason=SAFETY"), "{}", d);
        assert!(d.contains("candidates array is empty"), "{}", d);
    }

    #[test]
    fn diagnose_reports_finish_reason_and_safety() {
        let resp = json!({ "candidates": [{
            "finishReason": "MAX_TOKENS",
            "safetyRatings": [
                { "category": "HARM_CATEGORY_HARASSMENT", "probability": "HIGH" },
                { "category": "HARM_CATEGORY_HATE_SPEECH", "probability": "NEGLIGIBLE" }
            ]
        }] });
        let d = diagnose(&resp);
        assert!(d.contains("finishReason=MAX_TOKENS"));
        assert!(d.contains("HARM_CATEGORY_HARASSMENT=HIGH"));
        assert!(!d.contains("HATE_SPEECH"));
        assert!(d.contains("no 'content' field"));
    }

    // ── truncate_chars ───────────────────────────────────────────────────

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
