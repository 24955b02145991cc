//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use uuid::Uuid;

/// Generate a unique course id to avoid collisions between tests.
pub fn unique_course_id(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().to_string()[..8])
}

/// Material content whose repeated technical phrases survive the
/// deterministic fallback extractor.
pub fn sample_material_content() -> String {
    "A Binary Search Tree keeps keys in sorted order. Insertion into a \
     Binary Search Tree walks from the root. A Hash Table offers expected \
     constant-time lookup. Collisions in a Hash Table are resolved by \
     chaining. Gradient Descent minimizes a loss function. Each step of \
     gradient descent follows the negative gradient."
        .to_string()
}

/// Create a message event request body.
pub fn message_request(course_id: &str, student_id: &str, message: &str) -> serde_json::Value {
    json!({
        "course_id": course_id,
        "student_id": student_id,
        "message": message,
    })
}

/// Create a quiz submission request body. Every answer targets `topic`.
pub fn quiz_request(
    course_id: &str,
    student_id: &str,
    topic: &str,
    correct: usize,
    incorrect: usize,
) -> serde_json::Value {
    let mut answers = Vec::new();
    for _ in 0..correct {
        answers.push(json!({ "topic": topic, "is_correct": true }));
    }
    for _ in 0..incorrect {
        answers.push(json!({ "topic": topic, "is_correct": false }));
    }

    json!({
        "course_id": course_id,
        "student_id": student_id,
        "topic": topic,
        "score": correct,
        "total_questions": correct + incorrect,
        "answers": answers,
    })
}

/// Create a dismiss-card request body.
pub fn dismiss_request(card_id: Uuid, correct: Option<bool>) -> serde_json::Value {
    json!({ "card_id": card_id, "correct": correct })
}
