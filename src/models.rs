use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// Which document schema a generation request targets. Selects the fallback
/// template used when the model output cannot be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    McqSet,
    LessonPlan,
}

/// Caller-supplied parameters of one generation request. Only read when a
/// fallback document has to be synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub topic: String,
    /// Grade level for lesson plans, difficulty level for question sets.
    pub level: String,
    pub duration_minutes: u32,
    /// Number of questions requested.
    pub count: u32,
}

impl RequestContext {
    pub fn lesson(topic: impl Into<String>, grade_level: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            topic: topic.into(),
            level: grade_level.into(),
            duration_minutes,
            count: 0,
        }
    }

    pub fn questions(topic: impl Into<String>, level: impl Into<String>, count: u32) -> Self {
        Self {
            topic: topic.into(),
            level: level.into(),
            duration_minutes: 0,
            count,
        }
    }
}

// ---------------------------------------------------------------------------
// Multiple-choice questions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqSet {
    pub title: String,
    pub topic: String,
    pub level: String,
    pub questions: Vec<Question>,
}

// ---------------------------------------------------------------------------
// Lesson plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPhase {
    /// Human-readable label, e.g. "10 minutes".
    pub duration: String,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonStructure {
    pub introduction: LessonPhase,
    pub main_content: LessonPhase,
    pub conclusion: LessonPhase,
    pub assessment: LessonPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub title: String,
    pub topic: String,
    pub grade_level: String,
    /// Minutes.
    pub duration: u32,
    pub learning_objectives: Vec<String>,
    pub materials_needed: Vec<String>,
    pub lesson_structure: LessonStructure,
    pub key_concepts: Vec<String>,
    pub homework_assignment: String,
    pub additional_resources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Flashcards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub title: String,
    pub topic: String,
    pub level: String,
    pub flashcards: Vec<Flashcard>,
}

/// Serialize a schema value into a JSON mapping. All schema types above are
/// plain structs, so the object branch is the only one reached in practice.
pub fn into_object<T: Serialize>(doc: &T) -> Map<String, Value> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!("schema value serialized to non-object: {}", other);
            Map::new()
        }
        Err(e) => {
            tracing::warn!("schema value failed to serialize: {}", e);
            Map::new()
        }
    }
}
