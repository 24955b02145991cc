pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;
use crate::services::classifier::ClassifierClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub classifier: Arc<ClassifierClient>,
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Interaction ingestion
        .route("/api/interactions/message", post(routes::interactions::message))
        .route("/api/interactions/quiz", post(routes::interactions::quiz))
        // Mastery read models
        .route("/api/analytics/heatmap/:course_id", get(routes::analytics::heatmap))
        .route("/api/analytics/insights/:course_id", get(routes::analytics::insights))
        .route("/api/analytics/cleanup/:course_id", post(routes::analytics::cleanup))
        // Personalized learning
        .route("/api/learning/cards/:course_id", get(routes::learning::learning_cards))
        .route("/api/learning/cards/dismiss", post(routes::learning::dismiss_card))
        .route("/api/learning/study-plan/:course_id", get(routes::learning::study_plan))
        .route("/api/learning/progress/:course_id", get(routes::learning::student_progress))
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let classifier = ClassifierClient::from_env();
    if !classifier.is_available() {
        tracing::warn!("classifier not configured; extraction will use heuristic fallback");
    }

    let state = AppState {
        db: Arc::new(db),
        classifier: Arc::new(classifier),
    };

    let app = build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
