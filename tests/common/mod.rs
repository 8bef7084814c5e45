//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::Value;

use edugen_mcp::config::Config;
use edugen_mcp::gemini::{GenerationError, TextGenerator};
use edugen_mcp::state::{AppState, CircuitBreaker};

/// What the scripted generator answers with.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Status(u16, String),
}

/// Returns a fixed reply for every prompt and records the prompts it saw.
pub struct ScriptedGenerator {
    reply: Reply,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn text(raw: &str) -> Arc<Self> {
        Arc::new(Self { reply: Reply::Text(raw.to_string()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn failing(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Status(status, body.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(t) => Ok(t.clone()),
            Reply::Status(status, body) => {
                Err(GenerationError::Status { status: *status, body: body.clone() })
            }
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub fn test_config() -> Config {
    Config {
        gemini_api_key: Some("test-key".to_string()),
        ..Config::default()
    }
}

pub fn state_with(config: Config, generator: Arc<dyn TextGenerator>) -> AppState {
    AppState::with_generator(config, generator, Arc::new(CircuitBreaker::new("gemini")))
}

pub fn app_with(generator: Arc<dyn TextGenerator>) -> axum::Router {
    edugen_mcp::create_router(state_with(test_config(), generator))
}

/// Collect a response body into a `serde_json::Value`.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}
