//! Gamified student progress: XP, levels, streaks, and badges.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::models::*;

/// XP required per level.
const XP_PER_LEVEL: i32 = 100;

/// Mastery threshold used for the concept-mastery badge.
const MASTERED_THRESHOLD: f64 = 80.0;

/// What a dismissed card counted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    CardCompleted,
    QuizPassed,
}

#[derive(Debug, Clone, Copy)]
enum Requirement {
    CardsCompleted(i32),
    QuizzesPassed(i32),
    Streak(i32),
    ConceptsMastered(i64),
}

struct BadgeSpec {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    requirement: Requirement,
    xp_reward: i32,
}

const BADGES: &[BadgeSpec] = &[
    BadgeSpec {
        id: "first_steps",
        name: "First Steps",
        description: "Complete your first learning card",
        icon: "🎯",
        requirement: Requirement::CardsCompleted(1),
        xp_reward: 50,
    },
    BadgeSpec {
        id: "quiz_master",
        name: "Quiz Master",
        description: "Answer 5 quiz cards correctly",
        icon: "🧠",
        requirement: Requirement::QuizzesPassed(5),
        xp_reward: 100,
    },
    BadgeSpec {
        id: "week_warrior",
        name: "Week Warrior",
        description: "Maintain a 7-day study streak",
        icon: "🔥",
        requirement: Requirement::Streak(7),
        xp_reward: 150,
    },
    BadgeSpec {
        id: "concept_crusher",
        name: "Concept Crusher",
        description: "Master 3 concepts (reach 80% mastery)",
        icon: "💪",
        requirement: Requirement::ConceptsMastered(3),
        xp_reward: 200,
    },
    BadgeSpec {
        id: "dedicated_learner",
        name: "Dedicated Learner",
        description: "Complete 20 learning cards",
        icon: "📚",
        requirement: Requirement::CardsCompleted(20),
        xp_reward: 250,
    },
];

impl BadgeSpec {
    fn to_badge(&self) -> Badge {
        Badge {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            xp_reward: self.xp_reward,
        }
    }

    fn is_met(&self, progress: &DbStudentProgress, concepts_mastered: i64) -> bool {
        match self.requirement {
            Requirement::CardsCompleted(n) => progress.total_cards_completed >= n,
            Requirement::QuizzesPassed(n) => progress.total_quizzes_passed >= n,
            Requirement::Streak(n) => progress.study_streak >= n,
            Requirement::ConceptsMastered(n) => concepts_mastered >= n,
        }
    }
}

pub fn calculate_level(xp: i32) -> i32 {
    (xp / XP_PER_LEVEL).max(1)
}

pub fn level_name(level: i32) -> &'static str {
    if level < 5 {
        "Beginner"
    } else if level < 15 {
        "Intermediate"
    } else {
        "Advanced"
    }
}

/// Streak transition: same-day activity keeps it, a consecutive day extends
/// it, anything else restarts at one.
fn update_streak(last_activity: Option<NaiveDate>, today: NaiveDate, current: i32) -> i32 {
    match last_activity {
        Some(last) if last == today => current,
        Some(last) if last + Duration::days(1) == today => current + 1,
        _ => 1,
    }
}

/// Record an activity: add XP, advance streak and counters, then check for
/// newly earned badges. Returns the updated row plus any new badges.
pub async fn record_activity(
    db: &Database,
    student_id: &str,
    course_id: &str,
    xp_gain: i32,
    activity: Activity,
    now: DateTime<Utc>,
) -> Result<(DbStudentProgress, Vec<Badge>)> {
    let mut progress = db
        .get_progress(student_id, course_id)
        .await?
        .unwrap_or_else(|| DbStudentProgress::new(student_id, course_id, now));

    progress.xp += xp_gain;

    let today = now.date_naive();
    progress.study_streak = update_streak(progress.last_activity_date, today, progress.study_streak);
    progress.last_activity_date = Some(today);

    match activity {
        Activity::CardCompleted => progress.total_cards_completed += 1,
        Activity::QuizPassed => progress.total_quizzes_passed += 1,
    }

    let concepts_mastered = db
        .count_mastered(course_id, student_id, MASTERED_THRESHOLD)
        .await?;

    let mut new_badges = Vec::new();
    for spec in BADGES {
        if progress.badges_earned.iter().any(|id| id == spec.id) {
            continue;
        }
        if spec.is_met(&progress, concepts_mastered) {
            progress.badges_earned.push(spec.id.to_string());
            progress.xp += spec.xp_reward;
            new_badges.push(spec.to_badge());
        }
    }

    progress.level = calculate_level(progress.xp);
    progress.updated_at = now;

    db.upsert_progress(&progress).await?;

    Ok((progress, new_badges))
}

/// Read model for the progress dashboard.
pub async fn progress_view(
    db: &Database,
    course_id: &str,
    student_id: &str,
) -> Result<ProgressResponse> {
    let progress = db
        .get_progress(student_id, course_id)
        .await?
        .unwrap_or_else(|| DbStudentProgress::new(student_id, course_id, Utc::now()));

    let level = calculate_level(progress.xp);
    let xp_for_current_level = (level - 1) * XP_PER_LEVEL;
    let xp_for_next_level = level * XP_PER_LEVEL;

    let badges_earned: Vec<Badge> = BADGES
        .iter()
        .filter(|spec| progress.badges_earned.iter().any(|id| id == spec.id))
        .map(BadgeSpec::to_badge)
        .collect();
    let available_badges: Vec<Badge> = BADGES
        .iter()
        .filter(|spec| !progress.badges_earned.iter().any(|id| id == spec.id))
        .take(3)
        .map(BadgeSpec::to_badge)
        .collect();

    Ok(ProgressResponse {
        xp: progress.xp,
        level,
        level_name: level_name(level).to_string(),
        xp_for_next_level,
        xp_progress: progress.xp - xp_for_current_level,
        xp_needed: xp_for_next_level - progress.xp,
        study_streak: progress.study_streak,
        total_cards_completed: progress.total_cards_completed,
        total_quizzes_passed: progress.total_quizzes_passed,
        badges_earned,
        available_badges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_is_xp_over_one_hundred_with_floor_one() {
        assert_eq!(calculate_level(0), 1);
        assert_eq!(calculate_level(99), 1);
        assert_eq!(calculate_level(100), 1);
        assert_eq!(calculate_level(250), 2);
        assert_eq!(calculate_level(1500), 15);
    }

    #[test]
    fn level_names_follow_bands() {
        assert_eq!(level_name(1), "Beginner");
        assert_eq!(level_name(4), "Beginner");
        assert_eq!(level_name(5), "Intermediate");
        assert_eq!(level_name(14), "Intermediate");
        assert_eq!(level_name(15), "Advanced");
    }

    #[test]
    fn streak_holds_on_same_day() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(update_streak(Some(today), today, 4), 4);
    }

    #[test]
    fn streak_extends_on_consecutive_day() {
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(update_streak(Some(yesterday), today, 4), 5);
    }

    #[test]
    fn streak_resets_after_a_gap() {
        let last_week = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(update_streak(Some(last_week), today, 9), 1);
        assert_eq!(update_streak(None, today, 0), 1);
    }

    #[test]
    fn badge_requirements_check_the_right_counters() {
        let now = Utc::now();
        let mut progress = DbStudentProgress::new("student-1", "course-1", now);
        progress.total_cards_completed = 1;
        progress.total_quizzes_passed = 5;
        progress.study_streak = 7;

        let met: Vec<&str> = BADGES
            .iter()
            .filter(|spec| spec.is_met(&progress, 0))
            .map(|spec| spec.id)
            .collect();
        assert_eq!(met, vec!["first_steps", "quiz_master", "week_warrior"]);

        let met_with_mastery: Vec<&str> = BADGES
            .iter()
            .filter(|spec| spec.is_met(&progress, 3))
            .map(|spec| spec.id)
            .collect();
        assert!(met_with_mastery.contains(&"concept_crusher"));
    }
}
