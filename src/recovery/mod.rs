//! Structured recovery of model output.
//!
//! [`recover`] turns raw model text into a JSON mapping or, failing that, into
//! a deterministic fallback document annotated with an `error` field. Parsing
//! runs in layers that get progressively more invasive:
//!
//! 1. strict parse of the trimmed text,
//! 2. anchored fence strip, then parse,
//! 3. full [`sanitize`], then parse.
//!
//! The first layer that yields valid JSON decides the outcome. A mapping is
//! returned untouched; any other JSON value is a shape failure.
//!
//! Everything here is pure and synchronous. Upstream call failures are the
//! caller's concern (see `tools`).

pub mod fallback;
pub mod sanitize;

use serde_json::{Map, Value};

use crate::models::{DocumentKind, RequestContext};

pub use sanitize::{sanitize, strip_fences};

/// Why a fallback document was produced. The `Display` form is the exact text
/// stored under the fallback's `error` key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecoveryError {
    /// No layer produced syntactically valid JSON. Holds the parser message.
    #[error("JSON parsing failed: {0}")]
    Decode(String),

    /// Valid JSON whose top-level value is not a mapping.
    #[error("Generated with fallback structure")]
    Shape,
}

/// Error from [`parse_cleaned`].
#[derive(Debug, thiserror::Error)]
#[error("Could not decode JSON after cleaning: {source}. Cleaned string: '{cleaned}'")]
pub struct CleanParseError {
    pub cleaned: String,
    pub source: serde_json::Error,
}

/// Schema-complete stand-in for a document the model failed to deliver.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackDocument {
    pub cause: RecoveryError,
    pub document: Map<String, Value>,
}

impl FallbackDocument {
    pub fn new(ctx: &RequestContext, kind: DocumentKind, cause: RecoveryError) -> Self {
        let mut document = fallback::synthesize(ctx, kind);
        document.insert("error".to_string(), Value::String(cause.to_string()));
        Self { cause, document }
    }

    pub fn into_document(self) -> Map<String, Value> {
        self.document
    }
}

/// Recover a document of `kind` from raw model text.
///
/// `Ok` carries the parsed mapping exactly as the model wrote it (no `error`
/// key is added). `Err` carries the fallback, whose `error` key describes the
/// cause.
pub fn recover(
    raw: &str,
    ctx: &RequestContext,
    kind: DocumentKind,
) -> Result<Map<String, Value>, FallbackDocument> {
    let cause = match parse_layered(raw) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(other) => {
            tracing::warn!(
                kind = ?kind,
                found = json_type(&other),
                "model output is valid JSON but not an object; using fallback"
            );
            RecoveryError::Shape
        }
        Err(e) => {
            tracing::warn!(kind = ?kind, "model output is not valid JSON; using fallback: {}", e);
            RecoveryError::Decode(e.to_string())
        }
    };
    Err(FallbackDocument::new(ctx, kind, cause))
}

/// Caller-facing form of [`recover`]: always a mapping.
pub fn recover_document(raw: &str, ctx: &RequestContext, kind: DocumentKind) -> Map<String, Value> {
    recover(raw, ctx, kind).unwrap_or_else(FallbackDocument::into_document)
}

/// Sanitize then parse, without shape enforcement. Fails with the cleaned text
/// attached so callers can log exactly what the parser saw.
pub fn parse_cleaned(text: &str) -> Result<Value, CleanParseError> {
    let cleaned = sanitize(text);
    serde_json::from_str(&cleaned).map_err(|source| CleanParseError { cleaned, source })
}

fn parse_layered(raw: &str) -> Result<Value, serde_json::Error> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        tracing::debug!("recovery: strict parse succeeded");
        return Ok(value);
    }

    let unfenced = strip_fences(trimmed);
    if unfenced.len() != trimmed.len() {
        if let Ok(value) = serde_json::from_str(unfenced) {
            tracing::debug!("recovery: parsed after fence strip");
            return Ok(value);
        }
    }

    let value = parse_cleaned(raw).map_err(|e| e.source)?;
    tracing::debug!("recovery: parsed after full sanitize");
    Ok(value)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
