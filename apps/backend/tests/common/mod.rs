//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up the app against a real database
//! - Seeding helpers for materials and mastery rows
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL).
//! The classification service is never contacted: the context wires in a
//! disabled client so every generation path takes its deterministic fallback.

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use tutor_backend::db::Database;
use tutor_backend::services::classifier::ClassifierClient;
use tutor_backend::{build_router, AppState};

/// Test context containing database connection and test app.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations().await.expect("Failed to run migrations");

        let db = Arc::new(db);

        let state = AppState {
            db: db.clone(),
            classifier: Arc::new(ClassifierClient::disabled()),
        };

        let app = build_router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Seed one course material row.
    pub async fn seed_material(&self, course_id: &str, title: &str, content: &str) {
        self.db
            .insert_material(course_id, title, content, "notes")
            .await
            .expect("Failed to seed material");
    }

    /// Seed a mastery row directly, bypassing the concept filter. Used to
    /// model legacy rows that predate filtering.
    pub async fn seed_mastery_row(
        &self,
        course_id: &str,
        student_id: &str,
        concept: &str,
        mastery_score: f64,
        interactions: i32,
    ) {
        sqlx::query(
            r#"
            INSERT INTO concept_mastery (id, student_id, course_id, concept,
                                         mastery_score, interactions)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .bind(concept)
        .bind(mastery_score)
        .bind(interactions)
        .execute(self.db.pool())
        .await
        .expect("Failed to seed mastery row");
    }

    /// Count mastery rows stored for a course.
    pub async fn count_mastery_rows(&self, course_id: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM concept_mastery WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count mastery rows")
    }

    /// Clean up all test data for a course.
    ///
    /// Call this after tests to remove test data.
    pub async fn cleanup_course(&self, course_id: &str) {
        for table in [
            "concept_mastery",
            "course_materials",
            "quiz_attempts",
            "chat_messages",
            "learning_cards",
            "student_progress",
        ] {
            let _ = sqlx::query(&format!("DELETE FROM {table} WHERE course_id = $1"))
                .bind(course_id)
                .execute(self.db.pool())
                .await;
        }
    }
}
