//! Prompts sent to the model for each tool. Each one spells out the JSON shape
//! expected back; recovery copes when the model ignores it.

/// Prompt for `num` multiple-choice questions.
pub fn mcq_prompt(topic: &str, level: &str, num: u32) -> String {
    format!(
        r#"Create {num} multiple-choice questions about the topic: "{topic}"
Difficulty level: {level}

Return the questions in the following JSON format:
{{
    "title": "Multiple Choice Questions: {topic}",
    "topic": "{topic}",
    "level": "{level}",
    "questions": [
        {{
            "question": "Question text",
            "options": ["Option A", "Option B", "Option C", "Option D"],
            "answer": "The correct option, copied exactly from options",
            "explanation": "Why the answer is correct"
        }}
    ]
}}

Make sure the response is valid JSON only, no additional text."#
    )
}

/// Prompt for a lesson plan of `duration` minutes.
pub fn lesson_plan_prompt(
    topic: &str,
    grade_level: &str,
    duration: u32,
    learning_objectives: &[String],
) -> String {
    let objectives = if learning_objectives.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = learning_objectives.iter().map(|o| format!("- {}", o)).collect();
        format!("Cover these learning objectives:\n{}\n", list.join("\n"))
    };

    format!(
        r#"Create a detailed lesson plan for the topic: "{topic}"
Grade Level: {grade_level}
Duration: {duration} minutes
{objectives}
Please provide the lesson plan in the following JSON format:
{{
    "title": "Lesson title",
    "topic": "{topic}",
    "grade_level": "{grade_level}",
    "duration": {duration},
    "learning_objectives": ["Objective 1", "Objective 2", "Objective 3"],
    "materials_needed": ["Material 1", "Material 2", "Material 3"],
    "lesson_structure": {{
        "introduction": {{ "duration": "10 minutes", "activities": ["Activity description"] }},
        "main_content": {{ "duration": "35 minutes", "activities": ["Activity 1 description", "Activity 2 description"] }},
        "conclusion": {{ "duration": "10 minutes", "activities": ["Wrap-up activity"] }},
        "assessment": {{ "duration": "5 minutes", "activities": ["Assessment method"] }}
    }},
    "key_concepts": ["Concept 1", "Concept 2", "Concept 3"],
    "homework_assignment": "Description of homework or follow-up activities",
    "additional_resources": ["Resource 1", "Resource 2"]
}}

Phase durations must add up to {duration} minutes.
Make sure the response is valid JSON only, no additional text."#
    )
}
