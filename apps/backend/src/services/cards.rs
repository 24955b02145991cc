//! Learning-card generation and dismissal.
//!
//! Cards are generated for the concepts a student is weakest on. Summaries
//! and quiz questions come from the classification service when it is
//! configured; every generation step has a deterministic fallback so card
//! delivery never depends on the service being up.

use chrono::Utc;
use rand::Rng;
use sqlx::types::Json;
use tracing::warn;
use uuid::Uuid;

use mastery_core::reply::parse_reply;

use super::classifier::{strip_code_fences, ClassifierClient};
use super::progress::{self, Activity};
use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::*;

/// Existing active cards below this count trigger generation.
const MIN_ACTIVE_CARDS: usize = 3;

/// At most this many cards are generated in one request.
const CARD_BATCH: usize = 5;

/// Concepts below this mastery need review cards.
const NEEDS_REVIEW_BELOW: f64 = 60.0;

/// Share of generated cards that are plain review cards; the rest quiz.
const REVIEW_CARD_SHARE: f64 = 0.7;

const SUMMARY_SYSTEM_PROMPT: &str = "\
You are an educational assistant helping students review concepts.
Create a concise, clear summary (3-4 sentences) of the given concept that a
student can quickly read to refresh their understanding. Focus on the key
ideas and why this concept matters.";

const QUIZ_SYSTEM_PROMPT: &str = "\
You are an educational quiz generator. Create a single, clear multiple-choice
question to test understanding of a concept. The question should be at an
appropriate difficulty level for review.";

/// Return the student's active cards, generating new ones from their weakest
/// concepts when fewer than three remain.
pub async fn learning_cards(
    db: &Database,
    classifier: &ClassifierClient,
    course_id: &str,
    student_id: &str,
) -> Result<Vec<DbLearningCard>> {
    let existing = db.get_active_cards(course_id, student_id).await?;
    if existing.len() >= MIN_ACTIVE_CARDS {
        return Ok(existing);
    }

    let weak = db
        .get_concepts_below(course_id, student_id, NEEDS_REVIEW_BELOW, 10)
        .await?;
    let materials = db.get_materials(course_id).await?;

    let mut cards = existing;
    for record in weak.iter().take(CARD_BATCH) {
        if cards.iter().any(|card| card.concept == record.concept) {
            continue;
        }
        let card = build_card(classifier, &materials, record).await;
        db.insert_card(&card).await?;
        cards.push(card);
    }

    Ok(cards)
}

/// Dismiss a card, award XP, and update progress. Unknown cards are a
/// not-found condition.
pub async fn dismiss_card(
    db: &Database,
    card_id: Uuid,
    correct: Option<bool>,
) -> Result<DismissCardResponse> {
    let card = db
        .get_card(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("card {card_id}")))?;

    let now = Utc::now();
    db.dismiss_card(card_id, now).await?;

    let (xp_gained, activity) = match (card.card_type.as_str(), correct) {
        ("quiz", Some(true)) => (30, Activity::QuizPassed),
        ("quiz", _) => (10, Activity::CardCompleted),
        _ => (20, Activity::CardCompleted),
    };

    let (updated, new_badges) = progress::record_activity(
        db,
        &card.student_id,
        &card.course_id,
        xp_gained,
        activity,
        now,
    )
    .await?;

    Ok(DismissCardResponse {
        xp_gained,
        new_badges,
        current_xp: updated.xp,
        current_level: updated.level,
    })
}

async fn build_card(
    classifier: &ClassifierClient,
    materials: &[DbMaterial],
    record: &DbMasteryRecord,
) -> DbLearningCard {
    let concept = record.concept.as_str();
    let context = relevant_context(materials, concept);

    let content_summary = generate_summary(classifier, concept, &context).await;

    let card_type = if rand::thread_rng().gen_bool(REVIEW_CARD_SHARE) {
        "review"
    } else {
        "quiz"
    };

    let quiz_question = if card_type == "quiz" {
        Some(Json(generate_quick_quiz(classifier, concept, &context).await))
    } else {
        None
    };

    DbLearningCard {
        id: Uuid::new_v4(),
        student_id: record.student_id.clone(),
        course_id: record.course_id.clone(),
        concept: concept.to_string(),
        card_type: card_type.to_string(),
        content_summary,
        quiz_question,
        priority: card_priority(record.mastery_score),
        dismissed: false,
        completed_at: None,
        created_at: Utc::now(),
    }
}

/// Material excerpts mentioning the concept, for prompting.
fn relevant_context(materials: &[DbMaterial], concept: &str) -> String {
    let concept_lower = concept.to_lowercase();
    let excerpts: Vec<String> = materials
        .iter()
        .filter(|material| material.content.to_lowercase().contains(&concept_lower))
        .take(3)
        .map(|material| material.content.chars().take(500).collect())
        .collect();

    if excerpts.is_empty() {
        "No specific materials found.".to_string()
    } else {
        excerpts.join("\n\n")
    }
}

async fn generate_summary(classifier: &ClassifierClient, concept: &str, context: &str) -> String {
    let user_prompt = format!(
        "Concept: {concept}\n\nRelevant course materials:\n{context}\n\n\
         Create a brief, engaging summary that helps a student review this \
         concept. Keep it to 3-4 sentences maximum."
    );

    match classifier.complete(SUMMARY_SYSTEM_PROMPT, &user_prompt).await {
        Ok(reply) => parse_reply(&reply).markdown().trim().to_string(),
        Err(err) => {
            warn!(error = %err, concept, "summary generation fell back to template");
            fallback_summary(concept)
        }
    }
}

fn fallback_summary(concept: &str) -> String {
    format!(
        "Review the concept of {concept}. Focus on understanding the \
         fundamentals and how it connects to other topics in the course."
    )
}

async fn generate_quick_quiz(
    classifier: &ClassifierClient,
    concept: &str,
    context: &str,
) -> QuizQuestion {
    let user_prompt = format!(
        "Concept: {concept}\n\nCourse context:\n{context}\n\n\
         Generate ONE multiple-choice question in this exact JSON format:\n\
         {{\n    \"question\": \"Your question here\",\n    \
         \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"],\n    \
         \"correct_answer\": 0,\n    \
         \"explanation\": \"Brief explanation of why this is correct\"\n}}\n\n\
         Make the question clear and the options plausible."
    );

    match classifier.complete(QUIZ_SYSTEM_PROMPT, &user_prompt).await {
        Ok(reply) => match serde_json::from_str::<QuizQuestion>(strip_code_fences(&reply)) {
            Ok(question) if question.correct_answer < question.options.len() => question,
            Ok(_) | Err(_) => {
                warn!(concept, "quiz generation returned malformed JSON, using fallback");
                fallback_question(concept)
            }
        },
        Err(err) => {
            warn!(error = %err, concept, "quiz generation fell back to template");
            fallback_question(concept)
        }
    }
}

fn fallback_question(concept: &str) -> QuizQuestion {
    QuizQuestion {
        question: format!("What is a key characteristic of {concept}?"),
        options: vec![
            "It is fundamental to understanding the topic".to_string(),
            "It is rarely used in practice".to_string(),
            "It is only theoretical".to_string(),
            "It has no practical applications".to_string(),
        ],
        correct_answer: 0,
        explanation: format!("Understanding {concept} is crucial for mastering this subject."),
    }
}

/// Lower mastery means higher priority.
fn card_priority(mastery: f64) -> i32 {
    if mastery < 40.0 {
        1
    } else if mastery < 50.0 {
        2
    } else {
        3
    }
}
