//! Mastery read models: heatmap, insights, cleanup

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::Result;
use crate::models::*;
use crate::services::tracker;
use crate::AppState;

/// GET /api/analytics/heatmap/:course_id
pub async fn heatmap(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<HeatmapResponse>> {
    let heatmap = tracker::course_heatmap(&state.db, &course_id).await?;
    Ok(Json(heatmap))
}

/// GET /api/analytics/insights/:course_id?student_id=...
pub async fn insights(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<InsightsResponse>> {
    let insights = tracker::student_insights(&state.db, &course_id, &query.student_id).await?;
    Ok(Json(insights))
}

/// POST /api/analytics/cleanup/:course_id
///
/// Destructive maintenance: drop stored records whose concept fails the
/// filter. Everything else in this module is a pure read.
pub async fn cleanup(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CleanupResponse>> {
    let outcome = tracker::cleanup_course(&state.db, &course_id).await?;
    Ok(Json(outcome))
}
