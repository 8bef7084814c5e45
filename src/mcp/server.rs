//! MCP server: exposes the content tools as JSON-RPC 2.0 over HTTP POST `/mcp`.
//!
//! Supported methods:
//! - `initialize` — server info + capabilities
//! - `notifications/initialized` — client ack (no-op)
//! - `ping` — health check
//! - `tools/list` — list the tools
//! - `tools/call` — run a tool

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;
use crate::tools::{self, ToolError};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INVALID_REQUEST: i32 = -32600;

/// Axum handler for `POST /mcp`.
pub async fn mcp_handler(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    match handle_request(&state, &request).await {
        Some(response) => (StatusCode::OK, Json(response)),
        // Notifications get no JSON-RPC response body.
        None => (StatusCode::ACCEPTED, Json(json!({}))),
    }
}

/// Dispatch one JSON-RPC message. Returns `None` for notifications.
pub async fn handle_request(state: &AppState, request: &Value) -> Option<Value> {
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let id = request.get("id").cloned();

    tracing::debug!(method = %method, "MCP server: incoming request");

    if method.starts_with("notifications/") {
        return None;
    }
    let id = id.unwrap_or(Value::Null);

    let response = match method {
        "" => json_rpc_error(id, INVALID_REQUEST, "Missing 'method'"),
        "initialize" => handle_initialize(&id),
        "ping" => json_rpc_result(&id, json!({})),
        "tools/list" => json_rpc_result(&id, json!({ "tools": tool_list() })),
        "tools/call" => handle_tools_call(state, request, &id).await,
        _ => json_rpc_error(id, METHOD_NOT_FOUND, &format!("Method not found: {}", method)),
    };
    Some(response)
}

// ── initialize ──────────────────────────────────────────────────────────────

fn handle_initialize(id: &Value) -> Value {
    json_rpc_result(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": "edugen-mcp",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "Educational content tools: multiple-choice questions, lesson plans and flashcards. Every tool returns a JSON document; an 'error' field marks placeholder content."
        }),
    )
}

// ── tools/call ──────────────────────────────────────────────────────────────

async fn handle_tools_call(state: &AppState, request: &Value, id: &Value) -> Value {
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
    let tool_name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    if tool_name.is_empty() {
        return json_rpc_error(id.clone(), INVALID_PARAMS, "Missing 'name' in params");
    }

    tracing::info!(tool = %tool_name, "MCP server: tools/call");

    match tools::execute_tool(state, tool_name, &arguments).await {
        Ok(doc) => {
            let text = serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string());
            json_rpc_result(
                id,
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": doc,
                    "isError": false
                }),
            )
        }
        Err(ToolError::UnknownTool(name)) => {
            json_rpc_error(id.clone(), INVALID_PARAMS, &format!("Unknown tool: {}", name))
        }
        Err(e @ ToolError::InvalidArguments(_)) => json_rpc_result(
            id,
            json!({
                "content": [{ "type": "text", "text": format!("Error: {}", e) }],
                "isError": true
            }),
        ),
    }
}

// ── Tool list ───────────────────────────────────────────────────────────────

/// MCP `Tool` objects for every tool in [`crate::tools`].
pub fn tool_list() -> Vec<Value> {
    vec![
        mcp_tool(
            tools::GENERATE_MCQS,
            "Create multiple-choice questions for a topic at a given difficulty level. Returns {title, topic, level, questions:[{question, options, answer, explanation}]}.",
            json!({
                "type": "object",
                "properties": {
                    "topic": { "type": "string", "description": "Subject area, e.g. 'Photosynthesis'" },
                    "level": { "type": "string", "description": "Difficulty label", "default": tools::DEFAULT_LEVEL },
                    "num": { "type": "integer", "description": "Number of questions", "minimum": 1, "maximum": tools::MAX_COUNT, "default": tools::DEFAULT_COUNT }
                },
                "required": ["topic"]
            }),
        ),
        mcp_tool(
            tools::GENERATE_LESSON_PLAN,
            "Build a structured lesson plan with objectives, materials, timed phases, key concepts, homework and resources.",
            json!({
                "type": "object",
                "properties": {
                    "topic": { "type": "string", "description": "Lesson subject" },
                    "grade_level": { "type": "string", "description": "Intended grade level", "default": tools::DEFAULT_GRADE_LEVEL },
                    "duration": {
                        "description": "Lesson length in minutes, as a number or text like '60 minutes'",
                        "oneOf": [
                            { "type": "integer", "minimum": tools::MIN_DURATION_MINUTES, "maximum": tools::MAX_DURATION_MINUTES },
                            { "type": "string" }
                        ],
                        "default": tools::DEFAULT_DURATION_MINUTES
                    },
                    "learning_objectives": {
                        "description": "Objectives to cover, as a list or comma-separated text",
                        "oneOf": [{ "type": "array", "items": { "type": "string" } }, { "type": "string" }]
                    }
                },
                "required": ["topic"]
            }),
        ),
        mcp_tool(
            tools::GENERATE_FLASHCARDS,
            "Produce question/answer flashcards for spaced repetition, derived from generated multiple-choice questions.",
            json!({
                "type": "object",
                "properties": {
                    "topic": { "type": "string", "description": "Subject for the flashcards" },
                    "level": { "type": "string", "description": "Difficulty label", "default": tools::DEFAULT_LEVEL },
                    "num": { "type": "integer", "description": "Number of flashcards", "minimum": 1, "maximum": tools::MAX_COUNT, "default": tools::DEFAULT_COUNT }
                },
                "required": ["topic"]
            }),
        ),
    ]
}

fn mcp_tool(name: &str, description: &str, input_schema: Value) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": input_schema,
    })
}

// ── JSON-RPC helpers ────────────────────────────────────────────────────────

fn json_rpc_result(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn json_rpc_error(id: Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_list_names_all_tools() {
        let names: Vec<String> = tool_list()
            .iter()
            .filter_map(|t| t["name"].as_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["generate_mcqs", "generate_lesson_plan", "generate_flashcards"]);
    }

    #[test]
    fn every_tool_requires_topic() {
        for tool in tool_list() {
            assert_eq!(tool["inputSchema"]["required"], json!(["topic"]), "{}", tool["name"]);
        }
    }

    #[test]
    fn initialize_reports_protocol_version() {
        let resp = handle_initialize(&json!(1));
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(resp["result"]["serverInfo"]["name"], "edugen-mcp");
        assert_eq!(resp["id"], 1);
    }

    #[test]
    fn error_envelope_shape() {
        let resp = json_rpc_error(json!("abc"), METHOD_NOT_FOUND, "nope");
        assert_eq!(resp["jsonrpc"], "2.0");
        assert_eq!(resp["id"], "abc");
        assert_eq!(resp["error"]["code"], -32601);
    }
}
