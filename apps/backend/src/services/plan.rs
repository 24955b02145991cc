//! Personalized study-plan recommendations driven by concept mastery.

use crate::db::Database;
use crate::error::Result;
use crate::models::*;

/// Concepts below this mastery enter the study plan.
const PLAN_THRESHOLD: f64 = 60.0;

/// At most this many topics are recommended.
const MAX_RECOMMENDATIONS: usize = 5;

/// Build a study plan from the student's weakest concepts.
pub async fn study_plan(
    db: &Database,
    course_id: &str,
    student_id: &str,
) -> Result<StudyPlanResponse> {
    let weak = db
        .get_concepts_below(course_id, student_id, PLAN_THRESHOLD, 10)
        .await?;
    Ok(build_plan(&weak))
}

fn build_plan(records: &[DbMasteryRecord]) -> StudyPlanResponse {
    let Some(weakest) = records.first() else {
        return StudyPlanResponse {
            daily_focus: "Great job! All concepts are well understood. \
                          Try exploring advanced topics!"
                .to_string(),
            recommended_topics: Vec::new(),
            total_estimated_time: 0,
        };
    };

    let recommended_topics: Vec<RecommendedTopic> = records
        .iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|record| {
            let mastery = record.mastery_score;
            RecommendedTopic {
                concept: record.concept.clone(),
                current_mastery: (mastery * 10.0).round() / 10.0,
                estimated_time: estimated_minutes(mastery),
                priority: priority_label(mastery).to_string(),
                recommended_action: if mastery < 40.0 {
                    "Take a quiz".to_string()
                } else {
                    "Review materials".to_string()
                },
            }
        })
        .collect();

    StudyPlanResponse {
        daily_focus: weakest.concept.clone(),
        total_estimated_time: recommended_topics.iter().map(|t| t.estimated_time).sum(),
        recommended_topics,
    }
}

/// Weaker concepts get longer review slots.
fn estimated_minutes(mastery: f64) -> i32 {
    if mastery < 30.0 {
        45
    } else if mastery < 50.0 {
        30
    } else {
        20
    }
}

fn priority_label(mastery: f64) -> &'static str {
    if mastery < 40.0 {
        "High"
    } else if mastery < 50.0 {
        "Medium"
    } else {
        "Low"
    }
}
