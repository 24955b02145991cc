//! Concept detection in free-form student text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Connective words ignored when splitting a multi-word concept.
static CONNECTIVES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["the", "and", "for", "with"].into_iter().collect());

/// Default fraction of a concept's significant words that must appear in the
/// text for a partial match.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.6;

/// Strategy deciding whether a known concept is mentioned in a text.
///
/// The text is pre-lowercased by the caller; implementations lowercase the
/// concept themselves.
pub trait ConceptMatcher: Send + Sync {
    fn matches(&self, text_lower: &str, concept: &str) -> bool;
}

/// Default matcher: exact substring, then significant-word overlap for
/// multi-word concepts, whole-word boundary for single words.
///
/// The overlap rule tolerates paraphrase and partial mention at the cost of
/// some false positives.
#[derive(Debug, Clone)]
pub struct OverlapMatcher {
    pub threshold: f64,
}

impl Default for OverlapMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

impl ConceptMatcher for OverlapMatcher {
    fn matches(&self, text_lower: &str, concept: &str) -> bool {
        let concept_lower = concept.to_lowercase();

        if concept_lower.contains(' ') {
            if text_lower.contains(&concept_lower) {
                return true;
            }

            let significant: Vec<&str> = concept_lower
                .split_whitespace()
                .filter(|w| w.len() > 3 && !CONNECTIVES.contains(w))
                .collect();

            if significant.is_empty() {
                return false;
            }

            let present = significant
                .iter()
                .filter(|w| text_lower.contains(**w))
                .count();

            present as f64 / significant.len() as f64 >= self.threshold
        } else {
            // Single words match on word boundaries only, never as a
            // fragment of another word.
            whole_word_match(text_lower, &concept_lower)
        }
    }
}

/// Match a single word only on word boundaries, never inside another word.
fn whole_word_match(text: &str, word: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(word));
    Regex::new(&pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Detect which of the known concepts are mentioned in a text, preserving the
/// order of `known_concepts` and returning no duplicates.
pub fn detect_concepts(text: &str, known_concepts: &[String]) -> Vec<String> {
    detect_concepts_with(text, known_concepts, &OverlapMatcher::default())
}

/// As [`detect_concepts`], with an explicit matching strategy.
pub fn detect_concepts_with(
    text: &str,
    known_concepts: &[String],
    matcher: &dyn ConceptMatcher,
) -> Vec<String> {
    let text_lower = text.to_lowercase();
    let mut detected: Vec<String> = Vec::new();

    for concept in known_concepts {
        if detected.iter().any(|d| d == concept) {
            continue;
        }
        if matcher.matches(&text_lower, concept) {
            detected.push(concept.clone());
        }
    }

    detected
}
