//! HTTP handlers outside the MCP endpoint: health checks and the REST bridge
//! to the tools.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::AppState;
use crate::tools::{self, ToolError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// API error for the REST handlers.
/// Logs full details server-side, returns sanitized JSON to the client.
///
/// ```json
/// { "error": { "code": "BAD_REQUEST", "message": "...", "request_id": "uuid" } }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal details never reach the client.
    fn sanitized_message(&self) -> String {
        match self {
            ApiError::BadRequest(m) | ApiError::NotFound(m) => m.clone(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::UnknownTool(_) => ApiError::NotFound(e.to_string()),
            ToolError::InvalidArguments(_) => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let request_id = Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(request_id = %request_id, code = self.error_code(), "API error ({}): {}", status.as_u16(), self);
        } else {
            tracing::warn!(request_id = %request_id, code = self.error_code(), "API error ({}): {}", status.as_u16(), self);
        }

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.sanitized_message(),
                "request_id": request_id,
            }
        });
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": if state.is_ready() { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "app": "edugen-mcp",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "providers": [{
            "name": "Google Gemini",
            "model": state.generator.model(),
            "available": state.is_ready(),
            "circuit": state.gemini_circuit.state_label(),
        }],
        "tools": [tools::GENERATE_MCQS, tools::GENERATE_LESSON_PLAN, tools::GENERATE_FLASHCARDS],
    }))
}

/// GET /api/health/ready — 503 until an API key is configured.
pub async fn readiness(State(state): State<AppState>) -> axum::response::Response {
    let ready = state.is_ready();
    let body = json!({ "ready": ready, "uptime_seconds": state.start_time.elapsed().as_secs() });

    if ready {
        (StatusCode::OK, Json(body)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// POST /api/tools/{name} — run a tool with the JSON body as its arguments.
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let doc = tools::execute_tool(&state, &name, &args).await?;
    Ok(Json(doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_errors_map_to_client_errors() {
        let e: ApiError = ToolError::UnknownTool("nope".into()).into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        let e: ApiError = ToolError::InvalidArguments("num must be 1..=50".into()).into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.error_code(), "BAD_REQUEST");
    }

    #[test]
    fn internal_message_is_sanitized() {
        let e = ApiError::Internal("db password leaked".into());
        assert_eq!(e.sanitized_message(), "Internal server error");
    }
}
