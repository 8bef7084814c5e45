// Health endpoint integration tests.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use std::sync::Arc;
use std::time::Duration;

use edugen_mcp::config::Config;
use edugen_mcp::state::{AppState, CircuitBreaker};

use common::{app_with, body_json, state_with, test_config, ScriptedGenerator};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let response = app_with(ScriptedGenerator::text("{}"))
        .oneshot(get("/api/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_endpoint_reports_provider_and_tools() {
    let response = app_with(ScriptedGenerator::text("{}"))
        .oneshot(get("/api/health"))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["app"], "edugen-mcp");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_seconds"].is_u64());
    assert_eq!(json["providers"][0]["model"], "scripted");
    assert_eq!(json["providers"][0]["available"], true);
    assert_eq!(json["providers"][0]["circuit"], "closed");
    assert_eq!(json["tools"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn readiness_endpoint_returns_ok_with_api_key() {
    let response = app_with(ScriptedGenerator::text("{}"))
        .oneshot(get("/api/health/ready"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
}

#[tokio::test]
async fn readiness_returns_503_without_api_key() {
    let state = state_with(Config::default(), ScriptedGenerator::text("{}"));
    let response = edugen_mcp::create_router(state)
        .oneshot(get("/api/health/ready"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["ready"], false);
}

#[tokio::test]
async fn health_is_degraded_without_api_key() {
    let state = state_with(Config::default(), ScriptedGenerator::text("{}"));
    let response = edugen_mcp::create_router(state)
        .oneshot(get("/api/health"))
        .await
        .unwrap();

    let json: Value = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["providers"][0]["available"], false);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = app_with(ScriptedGenerator::text("{}"))
        .oneshot(get("/api/nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_the_generators_circuit() {
    let circuit = Arc::new(CircuitBreaker::with_limits("gemini", 1, Duration::from_secs(60)));
    let state = AppState::with_generator(test_config(), ScriptedGenerator::text("{}"), circuit.clone());
    let app = edugen_mcp::create_router(state);

    circuit.record_failure();

    let json = body_json(app.oneshot(get("/api/health")).await.unwrap()).await;
    assert_eq!(json["providers"][0]["circuit"], "open");
}
