//! Artifact stripping for model text that should contain a JSON document.
//!
//! Two passes of different strength:
//! - [`strip_fences`] only removes a markdown fence anchored at the very start
//!   and end of the text. Payload content is never touched.
//! - [`sanitize`] rewrites every occurrence of the known artifacts anywhere in
//!   the text. It cannot tell a stray backtick from one inside a JSON string,
//!   so callers should only reach for it after a strict parse has failed.

use std::sync::OnceLock;

use regex::Regex;

static OPEN_FENCE_RE: OnceLock<Regex> = OnceLock::new();
static CLOSE_FENCE_RE: OnceLock<Regex> = OnceLock::new();

/// Escape sequences left behind when the model output went through another
/// round of string serialization. Applied in order, before the artifact pass,
/// so that anything these collapse into is still cleaned below.
const ESCAPES: [(&str, &str); 5] = [
    ("\\n", " "),
    ("\\t", " "),
    ("\\\"", "\""),
    ("\\'", "'"),
    ("\\", ""),
];

/// Formatting artifacts. Each occurrence becomes a single space, so removing
/// one can never join its neighbours into a new one.
const ARTIFACTS: [&str; 9] = ["\r", "\n", "\t", "'''", "\"\"\"", "```", "`", "**", "*"];

/// Remove a leading ```` ```lang ```` line and a trailing ```` ``` ````, then trim.
///
/// Both anchors are optional and independent: a reply whose closing fence was
/// cut off by the token limit still loses its opening fence. A word after the
/// opening backticks is only a language tag when a line break follows it, so
/// a one-line fence such as ```` ```true``` ```` keeps its payload.
pub fn strip_fences(text: &str) -> &str {
    let open = OPEN_FENCE_RE.get_or_init(|| {
        Regex::new(r"^\s*```(?:[A-Za-z0-9_.+-]+[ \t]*\r?\n|[ \t]*(?:\r?\n)?)").unwrap()
    });
    let close = CLOSE_FENCE_RE.get_or_init(|| Regex::new(r"(?:\r?\n)?[ \t]*```\s*$").unwrap());

    let mut body = text;
    if let Some(m) = open.find(body) {
        body = &body[m.end()..];
    }
    if let Some(m) = close.find(body) {
        body = &body[..m.start()];
    }
    body.trim()
}

/// Strip transport and formatting artifacts from candidate JSON text.
///
/// The result never contains backticks, asterisks, backslashes, or raw
/// CR/LF/tab characters, and `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    let mut cleaned = strip_fences(text).to_string();

    for (from, to) in ESCAPES {
        if cleaned.contains(from) {
            cleaned = cleaned.replace(from, to);
        }
    }
    for artifact in ARTIFACTS {
        if cleaned.contains(artifact) {
            cleaned = cleaned.replace(artifact, " ");
        }
    }

    cleaned.trim().to_string()
}
