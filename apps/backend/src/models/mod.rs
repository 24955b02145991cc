//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from mastery-core
pub use mastery_core::mastery::{ConceptMastery, Interaction};
pub use mastery_core::types::Material;

// === Database Entity Types ===

/// Mastery record stored in PostgreSQL, one per (student, course, concept).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMasteryRecord {
    pub id: Uuid,
    pub student_id: String,
    pub course_id: String,
    pub concept: String,
    pub mastery_score: f64,
    pub interactions: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub last_interaction: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbMasteryRecord {
    /// Convert to the core scoring state.
    pub fn to_core_state(&self) -> ConceptMastery {
        ConceptMastery {
            concept: self.concept.clone(),
            mastery_score: self.mastery_score,
            interactions: self.interactions.max(0) as u32,
            correct_answers: self.correct_answers.max(0) as u32,
            total_questions: self.total_questions.max(0) as u32,
            last_interaction: self.last_interaction,
            updated_at: self.updated_at,
        }
    }
}

/// Course material row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMaterial {
    pub id: Uuid,
    pub course_id: String,
    pub title: String,
    pub content: String,
    pub material_type: String,
    pub created_at: DateTime<Utc>,
}

impl DbMaterial {
    /// Convert to the core material type consumed by extraction.
    pub fn to_core_material(&self) -> Material {
        Material {
            title: self.title.clone(),
            content: self.content.clone(),
            material_type: self.material_type.clone(),
        }
    }
}

/// One answer inside a quiz submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub topic: Option<String>,
    pub is_correct: bool,
}

/// Stored quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuizAttempt {
    pub id: Uuid,
    pub student_id: String,
    pub course_id: String,
    pub topic: Option<String>,
    pub score: i32,
    pub total_questions: i32,
    pub answers: Json<Vec<QuizAnswer>>,
    pub completed_at: DateTime<Utc>,
}

/// Stored chat message.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbChatMessage {
    pub id: Uuid,
    pub student_id: String,
    pub course_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A generated multiple-choice question attached to a quiz card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

/// Learning card surfaced to a student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLearningCard {
    pub id: Uuid,
    pub student_id: String,
    pub course_id: String,
    pub concept: String,
    pub card_type: String,
    pub content_summary: String,
    pub quiz_question: Option<Json<QuizQuestion>>,
    pub priority: i32,
    pub dismissed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Gamified progress per (student, course).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbStudentProgress {
    pub student_id: String,
    pub course_id: String,
    pub xp: i32,
    pub level: i32,
    pub badges_earned: Vec<String>,
    pub study_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub total_cards_completed: i32,
    pub total_quizzes_passed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbStudentProgress {
    /// Fresh progress row with zeroed counters.
    pub fn new(student_id: &str, course_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            xp: 0,
            level: 1,
            badges_earned: Vec::new(),
            study_streak: 0,
            last_activity_date: None,
            total_cards_completed: 0,
            total_quizzes_passed: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// === API Request/Response Types ===

/// Query selecting the student a read model is scoped to.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentQuery {
    pub student_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageEventRequest {
    pub course_id: String,
    pub student_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageEventResponse {
    pub detected_concepts: Vec<String>,
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizSubmissionRequest {
    pub course_id: String,
    pub student_id: String,
    pub topic: Option<String>,
    pub score: i32,
    pub total_questions: i32,
    pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizSubmissionResponse {
    pub attempt_id: Uuid,
    pub updated_concepts: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapEntry {
    pub concept: String,
    pub mastery: f64,
    pub interactions: i64,
    pub students: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapResponse {
    pub total_concepts: usize,
    pub total_students: usize,
    pub heatmap_data: Vec<HeatmapEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizScorePoint {
    pub date: String,
    pub score: i32,
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: String,
    pub score: i32,
    pub attempts: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscussedTopic {
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: String,
    pub questions: usize,
    pub quizzes: usize,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub total_questions_asked: usize,
    pub total_quizzes: usize,
    pub avg_quiz_score: i32,
    pub quiz_scores: Vec<QuizScorePoint>,
    pub quiz_by_topic: Vec<TopicScore>,
    pub most_discussed_topics: Vec<DiscussedTopic>,
    pub concept_mastery: HeatmapResponse,
    pub activity_streak: Vec<ActivityDay>,
    pub mastered_concepts: usize,
    pub weak_concepts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub deleted_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CardsResponse {
    pub cards: Vec<DbLearningCard>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DismissCardRequest {
    pub card_id: Uuid,
    pub correct: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DismissCardResponse {
    pub xp_gained: i32,
    pub new_badges: Vec<Badge>,
    pub current_xp: i32,
    pub current_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendedTopic {
    pub concept: String,
    pub current_mastery: f64,
    pub estimated_time: i32,
    pub priority: String,
    pub recommended_action: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudyPlanResponse {
    pub daily_focus: String,
    pub recommended_topics: Vec<RecommendedTopic>,
    pub total_estimated_time: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub xp: i32,
    pub level: i32,
    pub level_name: String,
    pub xp_for_next_level: i32,
    pub xp_progress: i32,
    pub xp_needed: i32,
    pub study_streak: i32,
    pub total_cards_completed: i32,
    pub total_quizzes_passed: i32,
    pub badges_earned: Vec<Badge>,
    pub available_badges: Vec<Badge>,
}
