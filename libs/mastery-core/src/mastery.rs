//! Confidence-weighted mastery scoring for a single (student, course, concept).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exploration-only scores are capped here: asking questions alone can never
/// push a concept past 30% without quiz validation.
pub const EXPLORATION_CAP: f64 = 30.0;

/// Maximum bonus contributed by raw interaction volume.
pub const INTERACTION_BONUS_CAP: f64 = 15.0;

/// A recorded event touching a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Question,
    QuizCorrect,
    QuizIncorrect,
}

impl Interaction {
    /// Default event weight: quiz answers carry more than chat questions.
    pub fn default_weight(self) -> f64 {
        match self {
            Self::Question => 1.0,
            Self::QuizCorrect | Self::QuizIncorrect => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::QuizCorrect => "quiz_correct",
            Self::QuizIncorrect => "quiz_incorrect",
        }
    }

    /// Parse from the wire/storage representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "question" => Some(Self::Question),
            "quiz_correct" => Some(Self::QuizCorrect),
            "quiz_incorrect" => Some(Self::QuizIncorrect),
            _ => None,
        }
    }
}

/// Mastery state for one (student, course, concept) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptMastery {
    pub concept: String,
    /// Score in [0, 100].
    pub mastery_score: f64,
    /// Count of all recorded events (question mentions and quiz answers).
    pub interactions: u32,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub last_interaction: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConceptMastery {
    /// Fresh record with zeroed counters and score.
    pub fn new(concept: &str, now: DateTime<Utc>) -> Self {
        Self {
            concept: concept.to_string(),
            mastery_score: 0.0,
            interactions: 0,
            correct_answers: 0,
            total_questions: 0,
            last_interaction: now,
            updated_at: now,
        }
    }

    /// Apply one interaction event and recompute the score.
    ///
    /// The exploration credit added for `Question` events is provisional: the
    /// full recompute at the end overwrites it, so the stored score depends
    /// only on the quiz counters and the interaction count. In particular
    /// `weight` does not reach the stored score.
    pub fn apply(&mut self, event: Interaction, weight: f64, now: DateTime<Utc>) {
        self.interactions += 1;
        self.last_interaction = now;
        self.updated_at = now;

        match event {
            Interaction::Question => {
                self.mastery_score = (self.mastery_score + 3.0 * weight).min(100.0);
            }
            Interaction::QuizCorrect => {
                self.correct_answers += 1;
                self.total_questions += 1;
            }
            Interaction::QuizIncorrect => {
                self.total_questions += 1;
            }
        }

        self.mastery_score = self.recompute_score();
    }

    /// Recompute the score from scratch out of the current counters.
    pub fn recompute_score(&self) -> f64 {
        if self.total_questions > 0 {
            let quiz_accuracy =
                100.0 * self.correct_answers as f64 / self.total_questions as f64;
            let adjusted = quiz_accuracy * confidence_factor(self.total_questions);
            let interaction_bonus =
                (self.interactions as f64 * 1.5).min(INTERACTION_BONUS_CAP);
            (adjusted + interaction_bonus).min(100.0)
        } else {
            (self.interactions as f64 * 3.0).min(EXPLORATION_CAP)
        }
    }
}

/// Confidence multiplier discounting quiz accuracy while the sample is small.
pub fn confidence_factor(total_questions: u32) -> f64 {
    match total_questions {
        0..=2 => 0.4,
        3..=4 => 0.6,
        5..=6 => 0.8,
        _ => 1.0,
    }
}
