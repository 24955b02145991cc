//! Interaction ingestion endpoints

use axum::{extract::State, Json};
use chrono::Utc;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::services::{extractor, tracker};
use crate::AppState;
use mastery_core::detect_concepts;
use mastery_core::mastery::Interaction;

/// POST /api/interactions/message
///
/// Turn a free-text student message into `question` interactions for every
/// course concept it mentions. Concepts that fail the filter are skipped, so
/// a message never errors out because of noisy extraction.
pub async fn message(
    State(state): State<AppState>,
    Json(payload): Json<MessageEventRequest>,
) -> Result<Json<MessageEventResponse>> {
    let materials: Vec<Material> = state
        .db
        .get_materials(&payload.course_id)
        .await?
        .iter()
        .map(DbMaterial::to_core_material)
        .collect();

    let vocabulary = extractor::extract_concepts(&state.classifier, &materials).await;
    let detected_concepts = detect_concepts(&payload.message, &vocabulary);

    let mut updated = 0;
    for concept in &detected_concepts {
        let kind = Interaction::Question;
        if tracker::record_interaction(
            &state.db,
            &payload.student_id,
            &payload.course_id,
            concept,
            kind,
            kind.default_weight(),
        )
        .await?
        {
            updated += 1;
        }
    }

    state
        .db
        .insert_chat_message(
            &payload.student_id,
            &payload.course_id,
            "user",
            &payload.message,
            Utc::now(),
        )
        .await?;

    Ok(Json(MessageEventResponse {
        detected_concepts,
        updated,
    }))
}

/// POST /api/interactions/quiz
///
/// Store a quiz attempt and fold each answer into concept mastery.
pub async fn quiz(
    State(state): State<AppState>,
    Json(payload): Json<QuizSubmissionRequest>,
) -> Result<Json<QuizSubmissionResponse>> {
    let attempt = DbQuizAttempt {
        id: Uuid::new_v4(),
        student_id: payload.student_id.clone(),
        course_id: payload.course_id.clone(),
        topic: payload.topic.clone(),
        score: payload.score,
        total_questions: payload.total_questions,
        answers: SqlJson(payload.answers.clone()),
        completed_at: Utc::now(),
    };
    state.db.insert_quiz_attempt(&attempt).await?;

    let mut updated_concepts = 0;
    for answer in &payload.answers {
        let concept = answer
            .topic
            .clone()
            .or_else(|| payload.topic.clone())
            .unwrap_or_else(|| "General".to_string());

        let kind = if answer.is_correct {
            Interaction::QuizCorrect
        } else {
            Interaction::QuizIncorrect
        };

        if tracker::record_interaction(
            &state.db,
            &payload.student_id,
            &payload.course_id,
            &concept,
            kind,
            kind.default_weight(),
        )
        .await?
        {
            updated_concepts += 1;
        }
    }

    Ok(Json(QuizSubmissionResponse {
        attempt_id: attempt.id,
        updated_concepts,
    }))
}
