//! Stopword gate deciding whether a candidate string is a concept worth tracking.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Generic terms that never qualify as concepts on their own.
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Question words
        "what", "how", "why", "when", "where", "who", "which", "that", "this", "these", "those",
        // Common words
        "data", "training", "testing", "test", "train", "information", "knowledge",
        // Course/learning terms
        "course", "lesson", "lecture", "chapter", "section", "module", "unit",
        "introduction", "overview", "summary", "conclusion", "example", "examples",
        "student", "students", "professor", "teacher", "learning", "study", "studying",
        // Generic verbs
        "understanding", "explain", "explaining", "understand", "learn", "teach", "know",
        // Generic concepts
        "concept", "concepts", "topic", "topics", "subject", "subjects",
        "material", "materials", "content", "contents",
        // Process words
        "process", "processes", "method", "methods", "approach", "approaches",
        "technique", "techniques", "strategy", "strategies",
        // System words
        "system", "systems", "model", "models", "framework", "frameworks",
        // Generic adjectives
        "basic", "advanced", "simple", "complex", "important", "key", "main",
        // Articles and prepositions
        "the", "and", "for", "with", "from", "about", "into", "through",
        // Others
        "different", "various", "several", "many", "some", "all", "each",
    ]
    .into_iter()
    .collect()
});

/// Words that disqualify a concept when they lead it.
static LEADING_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["what", "how", "why", "when", "where", "the", "a", "an"]
        .into_iter()
        .collect()
});

/// Decide whether a candidate string is a meaningful concept worth tracking.
///
/// Pure predicate, applied both before storing a mastery record and
/// defensively when reading aggregates back out of the store.
pub fn is_valid_concept(concept: &str) -> bool {
    let lowered = concept.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    if words.is_empty() {
        return false;
    }

    if STOPWORDS.contains(lowered.as_str()) {
        return false;
    }

    // Short single words are almost never domain terms.
    if words.len() == 1 && concept.chars().count() < 5 {
        return false;
    }

    if words.iter().all(|w| STOPWORDS.contains(w)) {
        return false;
    }

    if LEADING_WORDS.contains(words[0]) {
        return false;
    }

    if words.len() > 1 {
        let stopword_count = words.iter().filter(|w| STOPWORDS.contains(**w)).count();
        if stopword_count as f64 / words.len() as f64 > 0.7 {
            return false;
        }
    }

    if concept.chars().filter(|c| !c.is_whitespace()).count() < 4 {
        return false;
    }

    true
}
