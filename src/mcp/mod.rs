//! MCP (Model Context Protocol) server side.
//!
//! Protocol: JSON-RPC 2.0 over HTTP (no stdio transport).
//! Spec: <https://spec.modelcontextprotocol.io/2024-11-05/>

pub mod server;
