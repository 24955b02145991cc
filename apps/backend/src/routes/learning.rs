//! Learning cards, study plan, and progress endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::Result;
use crate::models::*;
use crate::services::{cards, plan, progress};
use crate::AppState;

/// GET /api/learning/cards/:course_id?student_id=...
pub async fn learning_cards(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<CardsResponse>> {
    let cards = cards::learning_cards(
        &state.db,
        &state.classifier,
        &course_id,
        &query.student_id,
    )
    .await?;
    Ok(Json(CardsResponse { cards }))
}

/// POST /api/learning/cards/dismiss
pub async fn dismiss_card(
    State(state): State<AppState>,
    Json(payload): Json<DismissCardRequest>,
) -> Result<Json<DismissCardResponse>> {
    let outcome = cards::dismiss_card(&state.db, payload.card_id, payload.correct).await?;
    Ok(Json(outcome))
}

/// GET /api/learning/study-plan/:course_id?student_id=...
pub async fn study_plan(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<StudyPlanResponse>> {
    let plan = plan::study_plan(&state.db, &course_id, &query.student_id).await?;
    Ok(Json(plan))
}

/// GET /api/learning/progress/:course_id?student_id=...
pub async fn student_progress(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<ProgressResponse>> {
    let view = progress::progress_view(&state.db, &course_id, &query.student_id).await?;
    Ok(Json(view))
}
