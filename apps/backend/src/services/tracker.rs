//! Mastery tracking: interaction recording, course heatmap, per-student
//! insights, and destructive cleanup of filter-violating legacy rows.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use mastery_core::filter::is_valid_concept;
use mastery_core::mastery::Interaction;

use crate::db::Database;
use crate::error::Result;
use crate::models::*;

/// Cap on mastery rows loaded per aggregation.
const AGGREGATION_LIMIT: i64 = 1000;

/// Mastery at or above this counts as mastered.
const MASTERED_THRESHOLD: f64 = 80.0;

/// Mastery below this makes a concept weak.
const WEAK_THRESHOLD: f64 = 40.0;

/// At most this many weak concepts are surfaced.
const MAX_WEAK_CONCEPTS: usize = 5;

/// Record one interaction against a concept.
///
/// Returns `false` without touching the store when the concept fails the
/// filter; invalid concepts are dropped silently rather than erroring.
pub async fn record_interaction(
    db: &Database,
    student_id: &str,
    course_id: &str,
    concept: &str,
    kind: Interaction,
    weight: f64,
) -> Result<bool> {
    if !is_valid_concept(concept) {
        return Ok(false);
    }

    db.record_interaction(student_id, course_id, concept, kind, weight, Utc::now())
        .await?;
    Ok(true)
}

/// Course-wide concept mastery heatmap.
pub async fn course_heatmap(db: &Database, course_id: &str) -> Result<HeatmapResponse> {
    let records = db.get_course_mastery(course_id, AGGREGATION_LIMIT).await?;
    Ok(aggregate_heatmap(&records, None))
}

/// Personalized learning insights for one student in a course.
pub async fn student_insights(
    db: &Database,
    course_id: &str,
    student_id: &str,
) -> Result<InsightsResponse> {
    let attempts = db.get_quiz_attempts(course_id, student_id).await?;
    let messages = db.get_student_messages(course_id, student_id).await?;
    let records = db.get_student_mastery(course_id, student_id).await?;

    let concept_mastery = aggregate_heatmap(&records, Some(student_id));
    let mastered_concepts = concept_mastery
        .heatmap_data
        .iter()
        .filter(|entry| entry.mastery >= MASTERED_THRESHOLD)
        .count();
    let weak_concepts = concept_mastery
        .heatmap_data
        .iter()
        .filter(|entry| entry.mastery < WEAK_THRESHOLD)
        .take(MAX_WEAK_CONCEPTS)
        .map(|entry| entry.concept.clone())
        .collect();

    Ok(InsightsResponse {
        total_questions_asked: messages.len(),
        total_quizzes: attempts.len(),
        avg_quiz_score: average_quiz_score(&attempts),
        quiz_scores: recent_quiz_scores(&attempts),
        quiz_by_topic: quiz_by_topic(&attempts),
        most_discussed_topics: most_discussed_topics(&messages),
        activity_streak: activity_streak(&messages, &attempts, Utc::now()),
        concept_mastery,
        mastered_concepts,
        weak_concepts,
    })
}

/// Delete every stored record for the course whose concept fails the filter.
pub async fn cleanup_course(db: &Database, course_id: &str) -> Result<CleanupResponse> {
    let records = db.get_course_mastery(course_id, AGGREGATION_LIMIT).await?;
    let stale: Vec<_> = records
        .iter()
        .filter(|record| !is_valid_concept(&record.concept))
        .map(|record| record.id)
        .collect();

    let deleted_count = db.delete_mastery_records(&stale).await?;
    Ok(CleanupResponse { deleted_count })
}

/// Group mastery rows by concept, re-applying the concept filter defensively
/// so legacy rows never leak into the read model.
///
/// Students are counted across all loaded rows, filtered or not, matching how
/// enrollment activity is reported elsewhere.
fn aggregate_heatmap(records: &[DbMasteryRecord], only_student: Option<&str>) -> HeatmapResponse {
    struct Accumulator {
        scores: Vec<f64>,
        interactions: i64,
        students: HashSet<String>,
    }

    let mut students: HashSet<&str> = HashSet::new();
    let mut by_concept: HashMap<&str, Accumulator> = HashMap::new();

    for record in records {
        if let Some(student) = only_student {
            if record.student_id != student {
                continue;
            }
        }
        students.insert(&record.student_id);

        if !is_valid_concept(&record.concept) {
            continue;
        }

        let acc = by_concept
            .entry(record.concept.as_str())
            .or_insert_with(|| Accumulator {
                scores: Vec::new(),
                interactions: 0,
                students: HashSet::new(),
            });
        acc.scores.push(record.mastery_score);
        acc.interactions += record.interactions as i64;
        acc.students.insert(record.student_id.clone());
    }

    let mut heatmap_data: Vec<HeatmapEntry> = by_concept
        .into_iter()
        .map(|(concept, acc)| {
            let avg = acc.scores.iter().sum::<f64>() / acc.scores.len() as f64;
            HeatmapEntry {
                concept: concept.to_string(),
                mastery: (avg * 10.0).round() / 10.0,
                interactions: acc.interactions,
                students: acc.students.len(),
            }
        })
        .collect();

    heatmap_data.sort_by(|a, b| {
        b.mastery
            .partial_cmp(&a.mastery)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.concept.cmp(&b.concept))
    });

    HeatmapResponse {
        total_concepts: heatmap_data.len(),
        total_students: students.len(),
        heatmap_data,
    }
}

/// Overall quiz accuracy as a rounded percentage.
fn average_quiz_score(attempts: &[DbQuizAttempt]) -> i32 {
    let total_score: i64 = attempts.iter().map(|a| a.score as i64).sum();
    let total_possible: i64 = attempts.iter().map(|a| a.total_questions as i64).sum();

    if total_possible == 0 {
        return 0;
    }
    (100.0 * total_score as f64 / total_possible as f64).round() as i32
}

/// Score trend over the last seven attempts.
fn recent_quiz_scores(attempts: &[DbQuizAttempt]) -> Vec<QuizScorePoint> {
    let skip = attempts.len().saturating_sub(7);
    attempts
        .iter()
        .skip(skip)
        .map(|attempt| QuizScorePoint {
            date: attempt.completed_at.format("%m/%d").to_string(),
            score: if attempt.total_questions > 0 {
                (100.0 * attempt.score as f64 / attempt.total_questions as f64).round() as i32
            } else {
                0
            },
            topic: attempt.topic.clone().unwrap_or_else(|| "General".to_string()),
        })
        .collect()
}

/// Quiz accuracy per topic, best topics first.
fn quiz_by_topic(attempts: &[DbQuizAttempt]) -> Vec<TopicScore> {
    struct Tally {
        correct: i64,
        total: i64,
    }

    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for attempt in attempts {
        let topic = attempt
            .topic
            .clone()
            .unwrap_or_else(|| "General".to_string());
        let tally = tallies.entry(topic.clone()).or_insert_with(|| {
            order.push(topic);
            Tally {
                correct: 0,
                total: 0,
            }
        });
        tally.correct += attempt.score as i64;
        tally.total += attempt.total_questions as i64;
    }

    let mut scores: Vec<TopicScore> = order
        .into_iter()
        .map(|topic| {
            let tally = &tallies[&topic];
            TopicScore {
                score: if tally.total > 0 {
                    (100.0 * tally.correct as f64 / tally.total as f64).round() as i32
                } else {
                    0
                },
                // Attempt count estimated from the usual five-question quiz.
                attempts: (tally.total / 5) as i32,
                topic,
            }
        })
        .collect();

    scores.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.topic.cmp(&b.topic)));
    scores
}

static TOPIC_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{5,}\b").expect("valid regex"));

static DISCUSSION_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "what", "which", "where", "when", "would", "could", "should", "about", "their", "there",
        "these", "those", "explain", "understand",
    ]
    .into_iter()
    .collect()
});

/// Most frequent non-generic words across the student's questions.
fn most_discussed_topics(messages: &[DbChatMessage]) -> Vec<DiscussedTopic> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for message in messages {
        let lowered = message.content.to_lowercase();
        for word in TOPIC_WORD.find_iter(&lowered) {
            let word = word.as_str();
            if DISCUSSION_STOPWORDS.contains(word) {
                continue;
            }
            let entry = counts.entry(word.to_string()).or_insert(0);
            if *entry == 0 {
                order.push(word.to_string());
            }
            *entry += 1;
        }
    }

    let mut topics: Vec<DiscussedTopic> = order
        .into_iter()
        .map(|topic| {
            let count = counts[&topic];
            DiscussedTopic { topic, count }
        })
        .collect();
    topics.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
    topics.truncate(10);
    topics
}

/// Day-by-day activity over the trailing week, oldest day first.
fn activity_streak(
    messages: &[DbChatMessage],
    attempts: &[DbQuizAttempt],
    now: DateTime<Utc>,
) -> Vec<ActivityDay> {
    (0..7)
        .rev()
        .map(|i| {
            let day_start = now - Duration::days(i + 1);
            let day_end = now - Duration::days(i);

            let questions = messages
                .iter()
                .filter(|m| m.created_at > day_start && m.created_at <= day_end)
                .count();
            let quizzes = attempts
                .iter()
                .filter(|a| a.completed_at > day_start && a.completed_at <= day_end)
                .count();

            ActivityDay {
                date: day_end.format("%m/%d").to_string(),
                questions,
                quizzes,
                active: questions > 0 || quizzes > 0,
            }
        })
        .collect()
}
