//! PostgreSQL database operations

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Mastery Repository ===

    /// Apply one interaction to the (student, course, concept) record and
    /// return the updated row.
    ///
    /// The whole load-modify-write runs inside one transaction with the row
    /// locked, so concurrent interactions against the same key serialize
    /// instead of losing updates.
    pub async fn record_interaction(
        &self,
        student_id: &str,
        course_id: &str,
        concept: &str,
        kind: Interaction,
        weight: f64,
        now: DateTime<Utc>,
    ) -> Result<DbMasteryRecord> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO concept_mastery (id, student_id, course_id, concept,
                                         last_interaction, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5, $5)
            ON CONFLICT (student_id, course_id, concept) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .bind(concept)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, DbMasteryRecord>(
            r#"
            SELECT id, student_id, course_id, concept, mastery_score, interactions,
                   correct_answers, total_questions, last_interaction, created_at, updated_at
            FROM concept_mastery
            WHERE student_id = $1 AND course_id = $2 AND concept = $3
            FOR UPDATE
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(concept)
        .fetch_one(&mut *tx)
        .await?;

        let mut state = row.to_core_state();
        state.apply(kind, weight, now);

        let updated = sqlx::query_as::<_, DbMasteryRecord>(
            r#"
            UPDATE concept_mastery
            SET mastery_score = $2, interactions = $3, correct_answers = $4,
                total_questions = $5, last_interaction = $6, updated_at = $6
            WHERE id = $1
            RETURNING id, student_id, course_id, concept, mastery_score, interactions,
                      correct_answers, total_questions, last_interaction, created_at, updated_at
            "#,
        )
        .bind(row.id)
        .bind(state.mastery_score)
        .bind(state.interactions as i32)
        .bind(state.correct_answers as i32)
        .bind(state.total_questions as i32)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Get all mastery records for a course, capped.
    pub async fn get_course_mastery(
        &self,
        course_id: &str,
        limit: i64,
    ) -> Result<Vec<DbMasteryRecord>> {
        let records = sqlx::query_as::<_, DbMasteryRecord>(
            r#"
            SELECT id, student_id, course_id, concept, mastery_score, interactions,
                   correct_answers, total_questions, last_interaction, created_at, updated_at
            FROM concept_mastery
            WHERE course_id = $1
            ORDER BY concept, student_id
            LIMIT $2
            "#,
        )
        .bind(course_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get one student's mastery records for a course.
    pub async fn get_student_mastery(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<Vec<DbMasteryRecord>> {
        let records = sqlx::query_as::<_, DbMasteryRecord>(
            r#"
            SELECT id, student_id, course_id, concept, mastery_score, interactions,
                   correct_answers, total_questions, last_interaction, created_at, updated_at
            FROM concept_mastery
            WHERE course_id = $1 AND student_id = $2
            ORDER BY mastery_score DESC, concept
            "#,
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Get a student's weakest concepts below a score threshold, ascending.
    pub async fn get_concepts_below(
        &self,
        course_id: &str,
        student_id: &str,
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<DbMasteryRecord>> {
        let records = sqlx::query_as::<_, DbMasteryRecord>(
            r#"
            SELECT id, student_id, course_id, concept, mastery_score, interactions,
                   correct_answers, total_questions, last_interaction, created_at, updated_at
            FROM concept_mastery
            WHERE course_id = $1 AND student_id = $2 AND mastery_score < $3
            ORDER BY mastery_score, concept
            LIMIT $4
            "#,
        )
        .bind(course_id)
        .bind(student_id)
        .bind(threshold)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Count a student's concepts at or above a mastery threshold.
    pub async fn count_mastered(
        &self,
        course_id: &str,
        student_id: &str,
        threshold: f64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM concept_mastery
            WHERE course_id = $1 AND student_id = $2 AND mastery_score >= $3
            "#,
        )
        .bind(course_id)
        .bind(student_id)
        .bind(threshold)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Delete mastery records by id, returning how many rows went away.
    pub async fn delete_mastery_records(&self, ids: &[Uuid]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM concept_mastery
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as usize)
    }

    // === Materials Repository ===

    /// Get all materials for a course.
    pub async fn get_materials(&self, course_id: &str) -> Result<Vec<DbMaterial>> {
        let materials = sqlx::query_as::<_, DbMaterial>(
            r#"
            SELECT id, course_id, title, content, material_type, created_at
            FROM course_materials
            WHERE course_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }

    /// Insert a material row. The materials pipeline itself is an external
    /// collaborator; this exists for seeding and tests.
    pub async fn insert_material(
        &self,
        course_id: &str,
        title: &str,
        content: &str,
        material_type: &str,
    ) -> Result<DbMaterial> {
        let material = sqlx::query_as::<_, DbMaterial>(
            r#"
            INSERT INTO course_materials (id, course_id, title, content, material_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, course_id, title, content, material_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(title)
        .bind(content)
        .bind(material_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(material)
    }

    // === Quiz Attempt Repository ===

    /// Insert a quiz attempt record
    pub async fn insert_quiz_attempt(&self, attempt: &DbQuizAttempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_attempts (id, student_id, course_id, topic, score,
                                       total_questions, answers, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(attempt.id)
        .bind(&attempt.student_id)
        .bind(&attempt.course_id)
        .bind(&attempt.topic)
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .bind(&attempt.answers)
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get one student's quiz attempts for a course, oldest first.
    pub async fn get_quiz_attempts(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<Vec<DbQuizAttempt>> {
        let attempts = sqlx::query_as::<_, DbQuizAttempt>(
            r#"
            SELECT id, student_id, course_id, topic, score, total_questions,
                   answers, completed_at
            FROM quiz_attempts
            WHERE course_id = $1 AND student_id = $2
            ORDER BY completed_at
            LIMIT 1000
            "#,
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    // === Chat Message Repository ===

    /// Insert a chat message record
    pub async fn insert_chat_message(
        &self,
        student_id: &str,
        course_id: &str,
        role: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, student_id, course_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .bind(role)
        .bind(content)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get one student's own messages for a course, oldest first.
    pub async fn get_student_messages(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<Vec<DbChatMessage>> {
        let messages = sqlx::query_as::<_, DbChatMessage>(
            r#"
            SELECT id, student_id, course_id, role, content, created_at
            FROM chat_messages
            WHERE course_id = $1 AND student_id = $2 AND role = 'user'
            ORDER BY created_at
            LIMIT 1000
            "#,
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    // === Learning Card Repository ===

    /// Get non-dismissed cards for a student in a course.
    pub async fn get_active_cards(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<Vec<DbLearningCard>> {
        let cards = sqlx::query_as::<_, DbLearningCard>(
            r#"
            SELECT id, student_id, course_id, concept, card_type, content_summary,
                   quiz_question, priority, dismissed, completed_at, created_at
            FROM learning_cards
            WHERE course_id = $1 AND student_id = $2 AND dismissed = FALSE
            ORDER BY priority, created_at
            LIMIT 100
            "#,
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    /// Insert a learning card
    pub async fn insert_card(&self, card: &DbLearningCard) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO learning_cards (id, student_id, course_id, concept, card_type,
                                        content_summary, quiz_question, priority,
                                        dismissed, completed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(card.id)
        .bind(&card.student_id)
        .bind(&card.course_id)
        .bind(&card.concept)
        .bind(&card.card_type)
        .bind(&card.content_summary)
        .bind(&card.quiz_question)
        .bind(card.priority)
        .bind(card.dismissed)
        .bind(card.completed_at)
        .bind(card.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a learning card by id
    pub async fn get_card(&self, card_id: Uuid) -> Result<Option<DbLearningCard>> {
        let card = sqlx::query_as::<_, DbLearningCard>(
            r#"
            SELECT id, student_id, course_id, concept, card_type, content_summary,
                   quiz_question, priority, dismissed, completed_at, created_at
            FROM learning_cards
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Mark a card dismissed
    pub async fn dismiss_card(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE learning_cards
            SET dismissed = TRUE, completed_at = $2
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Progress Repository ===

    /// Get a student's progress for a course
    pub async fn get_progress(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<DbStudentProgress>> {
        let progress = sqlx::query_as::<_, DbStudentProgress>(
            r#"
            SELECT student_id, course_id, xp, level, badges_earned, study_streak,
                   last_activity_date, total_cards_completed, total_quizzes_passed,
                   created_at, updated_at
            FROM student_progress
            WHERE student_id = $1 AND course_id = $2
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Upsert a progress row
    pub async fn upsert_progress(&self, progress: &DbStudentProgress) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO student_progress (student_id, course_id, xp, level, badges_earned,
                                          study_streak, last_activity_date,
                                          total_cards_completed, total_quizzes_passed,
                                          created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (student_id, course_id) DO UPDATE SET
                xp = EXCLUDED.xp,
                level = EXCLUDED.level,
                badges_earned = EXCLUDED.badges_earned,
                study_streak = EXCLUDED.study_streak,
                last_activity_date = EXCLUDED.last_activity_date,
                total_cards_completed = EXCLUDED.total_cards_completed,
                total_quizzes_passed = EXCLUDED.total_quizzes_passed,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&progress.student_id)
        .bind(&progress.course_id)
        .bind(progress.xp)
        .bind(progress.level)
        .bind(&progress.badges_earned)
        .bind(progress.study_streak)
        .bind(progress.last_activity_date)
        .bind(progress.total_cards_completed)
        .bind(progress.total_quizzes_passed)
        .bind(progress.created_at)
        .bind(progress.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
