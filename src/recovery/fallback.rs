//! Deterministic placeholder documents built from the request parameters.
//!
//! Every string is templated from the topic, level, or duration so the result
//! still reads sensibly without a live model.

use serde_json::{Map, Value};

use crate::models::{
    into_object, DocumentKind, LessonPhase, LessonPlan, LessonStructure, McqSet, Question,
    RequestContext,
};

/// Schema-complete document for `kind`, without the `error` annotation.
pub fn synthesize(ctx: &RequestContext, kind: DocumentKind) -> Map<String, Value> {
    match kind {
        DocumentKind::McqSet => into_object(&mcq_set(ctx)),
        DocumentKind::LessonPlan => into_object(&lesson_plan(ctx)),
    }
}

/// Minimal document returned when the upstream call itself failed, so there
/// is no text to recover from.
pub fn upstream_failure(ctx: &RequestContext, kind: DocumentKind, message: &str) -> Map<String, Value> {
    let mut doc = Map::new();
    match kind {
        DocumentKind::LessonPlan => {
            doc.insert("title".into(), Value::String(format!("Lesson Plan: {}", ctx.topic)));
            doc.insert("topic".into(), Value::String(ctx.topic.clone()));
            doc.insert("grade_level".into(), Value::String(ctx.level.clone()));
            doc.insert("duration".into(), Value::from(ctx.duration_minutes));
            doc.insert(
                "error".into(),
                Value::String(format!("Failed to generate lesson plan: {}", message)),
            );
        }
        DocumentKind::McqSet => {
            doc.insert(
                "title".into(),
                Value::String(format!("Multiple Choice Questions: {}", ctx.topic)),
            );
            doc.insert("topic".into(), Value::String(ctx.topic.clone()));
            doc.insert("level".into(), Value::String(ctx.level.clone()));
            doc.insert("questions".into(), Value::Array(Vec::new()));
            doc.insert(
                "error".into(),
                Value::String(format!("Failed to generate questions: {}", message)),
            );
        }
    }
    doc
}

pub fn lesson_plan(ctx: &RequestContext) -> LessonPlan {
    let topic = ctx.topic.as_str();
    let [intro, main, conclusion, assessment] = phase_minutes(ctx.duration_minutes);

    LessonPlan {
        title: format!("Lesson Plan: {}", topic),
        topic: topic.to_string(),
        grade_level: ctx.level.clone(),
        duration: ctx.duration_minutes,
        learning_objectives: vec![
            format!("Understand the fundamentals of {}", topic),
            format!("Apply {} concepts in real-world scenarios", topic),
            format!("Evaluate and analyze {} information", topic),
        ],
        materials_needed: vec![
            "Whiteboard".to_string(),
            format!("Presentation slides on {}", topic),
            format!("Student handouts ({})", ctx.level),
        ],
        lesson_structure: LessonStructure {
            introduction: phase(intro, vec![format!("Warm-up activity introducing {}", topic)]),
            main_content: phase(
                main,
                vec![
                    format!("Lecture on {} fundamentals", topic),
                    format!("Interactive {} demonstration", topic),
                    format!("Group activity exploring {}", topic),
                ],
            ),
            conclusion: phase(
                conclusion,
                vec![
                    format!("Review key points of {}", topic),
                    "Q&A session".to_string(),
                ],
            ),
            assessment: phase(
                assessment,
                vec![format!("Exit ticket or quick assessment on {}", topic)],
            ),
        },
        key_concepts: vec![format!("Core principles of {}", topic)],
        homework_assignment: format!("Research and write about {} applications", topic),
        additional_resources: vec![
            format!("Textbook chapters on {}", topic),
            format!("Online videos about {}", topic),
            format!("Practice worksheets for {}", ctx.level),
        ],
    }
}

pub fn mcq_set(ctx: &RequestContext) -> McqSet {
    let topic = ctx.topic.as_str();
    let questions = (1..=ctx.count.max(1))
        .map(|n| {
            let options = vec![
                format!("A foundational principle of {}", topic),
                format!("A claim unrelated to {}", topic),
                format!("A common misconception about {}", topic),
                "None of the above".to_string(),
            ];
            Question {
                question: format!("Question {}: Which statement best describes a core idea of {}?", n, topic),
                answer: options[0].clone(),
                options,
                explanation: Some(format!(
                    "Placeholder question for {} learners; review the fundamentals of {} to confirm.",
                    ctx.level, topic
                )),
            }
        })
        .collect();

    McqSet {
        title: format!("Multiple Choice Questions: {}", topic),
        topic: topic.to_string(),
        level: ctx.level.clone(),
        questions,
    }
}

fn phase(minutes: u32, activities: Vec<String>) -> LessonPhase {
    LessonPhase {
        duration: format!("{} minutes", minutes),
        activities,
    }
}

/// Split a lesson into introduction / main / conclusion / assessment minutes:
/// one sixth, the remainder, one sixth, one twelfth. Every phase gets at least
/// one minute, so the labels only add up to `total` from 4 minutes upwards;
/// the tools reject anything shorter than 5.
fn phase_minutes(total: u32) -> [u32; 4] {
    let intro = (total / 6).max(1);
    let conclusion = (total / 6).max(1);
    let assessment = (total / 12).max(1);
    let main = total.saturating_sub(intro + conclusion + assessment).max(1);
    [intro, main, conclusion, assessment]
}
