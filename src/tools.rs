//! The three content tools exposed to MCP clients:
//! - `generate_mcqs` — multiple-choice questions for a topic
//! - `generate_lesson_plan` — structured lesson plan
//! - `generate_flashcards` — question/answer cards derived from generated MCQs
//!
//! Every tool returns a JSON mapping. Model output goes through
//! [`crate::recovery`]; a failed upstream call becomes a minimal document with
//! an `error` key. Only malformed arguments are reported as errors.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::gemini::TextGenerator;
use crate::models::{into_object, DocumentKind, Flashcard, FlashcardDeck, RequestContext};
use crate::prompts;
use crate::recovery::{fallback, recover_document};
use crate::state::AppState;

pub const GENERATE_MCQS: &str = "generate_mcqs";
pub const GENERATE_LESSON_PLAN: &str = "generate_lesson_plan";
pub const GENERATE_FLASHCARDS: &str = "generate_flashcards";

pub const DEFAULT_LEVEL: &str = "Beginner";
pub const DEFAULT_GRADE_LEVEL: &str = "Middle School";
pub const DEFAULT_COUNT: u32 = 5;
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const MAX_COUNT: u32 = 50;
/// Shortest lesson whose four phases still add up to the requested length.
pub const MIN_DURATION_MINUTES: u32 = 5;
pub const MAX_DURATION_MINUTES: u32 = 600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

// ── Arguments ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuestionArgs {
    topic: String,
    #[serde(default = "default_level")]
    level: String,
    #[serde(default = "default_count")]
    num: u32,
}

#[derive(Debug, Deserialize)]
struct LessonPlanArgs {
    topic: String,
    #[serde(default = "default_grade_level")]
    grade_level: String,
    #[serde(default)]
    duration: Option<DurationArg>,
    #[serde(default)]
    learning_objectives: Option<ObjectivesArg>,
}

/// Minutes as a number, or free text such as "60 minutes".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DurationArg {
    Minutes(u32),
    Text(String),
}

/// A list, or one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObjectivesArg {
    List(Vec<String>),
    Text(String),
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

fn default_grade_level() -> String {
    DEFAULT_GRADE_LEVEL.to_string()
}

fn default_count() -> u32 {
    DEFAULT_COUNT
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn require_topic(topic: &str) -> Result<String, ToolError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ToolError::InvalidArguments("'topic' must not be empty".into()));
    }
    Ok(topic.to_string())
}

fn question_context(args: &Value) -> Result<RequestContext, ToolError> {
    let a: QuestionArgs = parse_args(args)?;
    if a.num == 0 || a.num > MAX_COUNT {
        return Err(ToolError::InvalidArguments(format!(
            "'num' must be between 1 and {}, got {}",
            MAX_COUNT, a.num
        )));
    }
    Ok(RequestContext::questions(require_topic(&a.topic)?, a.level, a.num))
}

/// Leading decimal digits of `text` as minutes: "45 minutes" → 45.
pub fn parse_leading_minutes(text: &str) -> Option<u32> {
    let digits: String = text.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn duration_minutes(arg: Option<DurationArg>) -> Result<u32, ToolError> {
    let minutes = match arg {
        None => DEFAULT_DURATION_MINUTES,
        Some(DurationArg::Minutes(m)) => m,
        Some(DurationArg::Text(text)) => parse_leading_minutes(&text).ok_or_else(|| {
            ToolError::InvalidArguments(format!("'duration' {:?} does not start with a number of minutes", text))
        })?,
    };
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(ToolError::InvalidArguments(format!(
            "'duration' must be between {} and {} minutes, got {}",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES, minutes
        )));
    }
    Ok(minutes)
}

fn objectives(arg: Option<ObjectivesArg>) -> Vec<String> {
    let raw = match arg {
        None => return Vec::new(),
        Some(ObjectivesArg::List(list)) => list,
        Some(ObjectivesArg::Text(text)) => text.split(',').map(str::to_string).collect(),
    };
    raw.into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

// ── Dispatch ────────────────────────────────────────────────────────────────

/// Run tool `name` with JSON `args` and return its document.
pub async fn execute_tool(state: &AppState, name: &str, args: &Value) -> Result<Value, ToolError> {
    let generator = state.generator.as_ref();

    let doc = match name {
        GENERATE_MCQS => {
            let ctx = question_context(args)?;
            generate_mcqs(generator, &ctx).await
        }
        GENERATE_FLASHCARDS => {
            let ctx = question_context(args)?;
            generate_flashcards(generator, &ctx).await
        }
        GENERATE_LESSON_PLAN => {
            let a: LessonPlanArgs = parse_args(args)?;
            let ctx = RequestContext::lesson(
                require_topic(&a.topic)?,
                a.grade_level,
                duration_minutes(a.duration)?,
            );
            generate_lesson_plan(generator, &ctx, &objectives(a.learning_objectives)).await
        }
        other => return Err(ToolError::UnknownTool(other.to_string())),
    };

    if let Some(err) = doc.get("error").and_then(Value::as_str) {
        tracing::warn!(tool = %name, "tool returned degraded document: {}", err);
    } else {
        tracing::info!(tool = %name, "tool completed");
    }
    Ok(Value::Object(doc))
}

// ── Pipelines ───────────────────────────────────────────────────────────────

pub async fn generate_mcqs(generator: &dyn TextGenerator, ctx: &RequestContext) -> Map<String, Value> {
    tracing::info!(topic = %ctx.topic, level = %ctx.level, num = ctx.count, "generating MCQs");
    let prompt = prompts::mcq_prompt(&ctx.topic, &ctx.level, ctx.count);
    match generator.generate(&prompt).await {
        Ok(raw) => recover_document(&raw, ctx, DocumentKind::McqSet),
        Err(e) => {
            tracing::error!(model = generator.model(), "MCQ generation failed: {}", e);
            fallback::upstream_failure(ctx, DocumentKind::McqSet, &e.to_string())
        }
    }
}

pub async fn generate_lesson_plan(
    generator: &dyn TextGenerator,
    ctx: &RequestContext,
    learning_objectives: &[String],
) -> Map<String, Value> {
    tracing::info!(
        topic = %ctx.topic,
        grade_level = %ctx.level,
        duration = ctx.duration_minutes,
        "generating lesson plan"
    );
    let prompt = prompts::lesson_plan_prompt(&ctx.topic, &ctx.level, ctx.duration_minutes, learning_objectives);
    match generator.generate(&prompt).await {
        Ok(raw) => recover_document(&raw, ctx, DocumentKind::LessonPlan),
        Err(e) => {
            tracing::error!(model = generator.model(), "lesson plan generation failed: {}", e);
            fallback::upstream_failure(ctx, DocumentKind::LessonPlan, &e.to_string())
        }
    }
}

/// Generate MCQs and keep only question + answer. An `error` from the MCQ step
/// is carried over unchanged.
pub async fn generate_flashcards(generator: &dyn TextGenerator, ctx: &RequestContext) -> Map<String, Value> {
    let mcqs = generate_mcqs(generator, ctx).await;
    let deck = FlashcardDeck {
        title: format!("Flashcards: {}", ctx.topic),
        topic: ctx.topic.clone(),
        level: ctx.level.clone(),
        flashcards: flashcards_from_mcqs(&mcqs),
    };

    let mut doc = into_object(&deck);
    if let Some(err) = mcqs.get("error") {
        doc.insert("error".to_string(), err.clone());
    }
    doc
}

/// Entries without string `question` and `answer` fields are skipped.
pub fn flashcards_from_mcqs(mcqs: &Map<String, Value>) -> Vec<Flashcard> {
    let Some(questions) = mcqs.get("questions").and_then(Value::as_array) else {
        tracing::warn!("MCQ document has no 'questions' list; no flashcards produced");
        return Vec::new();
    };

    questions
        .iter()
        .filter_map(|q| match serde_json::from_value::<Flashcard>(q.clone()) {
            Ok(card) => Some(card),
            Err(e) => {
                tracing::warn!("skipping question unusable as flashcard: {}", e);
                None
            }
        })
        .collect()
}
