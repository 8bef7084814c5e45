pub mod config;
pub mod gemini;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod prompts;
pub mod recovery;
pub mod state;
pub mod tools;

use axum::routing::{get, post};
use axum::Router;

use state::AppState;

/// Build the application router with the given state.
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a network port.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health))
        .route("/api/health/ready", get(handlers::readiness))
        // REST bridge to the tools
        .route("/api/tools/{name}", post(handlers::call_tool))
        // MCP JSON-RPC
        .route("/mcp", post(mcp::server::mcp_handler))
        .with_state(state)
}
