//! Deterministic fallback concept extraction from raw material text.
//!
//! Used whenever the external classification service is unavailable or
//! returns something unusable. Weaker than the classifier but never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::types::Material;

/// At most this many materials contribute to the combined text.
pub const MAX_MATERIALS: usize = 10;

/// Per-material content cap, in characters.
pub const MAX_CONTENT_CHARS: usize = 1500;

/// Upper bound on extracted concepts.
pub const MAX_CONCEPTS: usize = 15;

/// Minimum number of occurrences before a term counts as a concept.
const MIN_OCCURRENCES: u32 = 2;

/// Minimum term length for the fallback path.
const MIN_TERM_LEN: usize = 6;

/// Two to four consecutive capitalized words.
static CAPITALIZED_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3}\b").expect("valid regex"));

/// Fixed domain technical-term patterns, matched case-insensitively.
static TECHNICAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:algorithm|data structure|neural network|machine learning|deep learning)\b",
        r"(?i)\b(?:supervised|unsupervised|reinforcement)\s+learning\b",
        r"(?i)\b(?:binary|linear|hash|merge|quick)\s+(?:search|sort|tree|table)\b",
        r"(?i)\b(?:linked|doubly)\s+list\b",
        r"(?i)\b(?:gradient|stochastic)\s+descent\b",
        r"(?i)\b(?:time|space)\s+complexity\b",
        r"(?i)\b(?:object|functional|procedural)\s+programming\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Title-cased terms excluded from the fallback output.
static EXCLUDED_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Data", "Training", "Testing", "What", "How", "Course", "Introduction", "Overview",
        "Example", "Chapter", "The", "This", "That", "With", "From",
    ]
    .into_iter()
    .collect()
});

/// Combine materials into one prompt/extraction text: first ten materials,
/// content truncated per material, title interleaved.
pub fn combined_material_text(materials: &[Material]) -> String {
    let mut text = String::new();
    for material in materials.iter().take(MAX_MATERIALS) {
        let content: String = material.content.chars().take(MAX_CONTENT_CHARS).collect();
        text.push('\n');
        text.push_str(&material.title);
        text.push('\n');
        text.push_str(&content);
        text.push('\n');
    }
    text
}

/// Extract candidate concepts from text using capitalized-phrase and
/// technical-term matching, keeping terms seen at least twice, ranked by
/// frequency.
pub fn extract_fallback_concepts(text: &str) -> Vec<String> {
    // Tally in first-seen order so that equal counts rank deterministically.
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut tally = |term: String| {
        let entry = counts.entry(term.clone()).or_insert(0);
        if *entry == 0 {
            order.push(term);
        }
        *entry += 1;
    };

    for m in CAPITALIZED_PHRASE.find_iter(text) {
        tally(m.as_str().to_string());
    }
    for pattern in TECHNICAL_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            tally(title_case(m.as_str()));
        }
    }

    let mut ranked: Vec<(String, u32)> = order
        .into_iter()
        .map(|term| {
            let count = counts[&term];
            (term, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .filter(|(term, count)| {
            *count >= MIN_OCCURRENCES
                && !EXCLUDED_TERMS.contains(term.as_str())
                && term.chars().count() > MIN_TERM_LEN - 1
        })
        .take(MAX_CONCEPTS)
        .map(|(term, _)| term)
        .collect()
}

/// Capitalize the first letter of each word, lowercasing the rest.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str().to_lowercase().as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_capitalized_phrases_are_extracted() {
        let text = "Binary Search Tree operations. A Binary Search Tree keeps order. \
                    Hash Table lookups. Hash Table collisions. Mentioned Once here.";
        let concepts = extract_fallback_concepts(text);
        assert!(concepts.contains(&"Binary Search Tree".to_string()));
        assert!(concepts.contains(&"Hash Table".to_string()));
        assert!(!concepts.contains(&"Mentioned Once".to_string()));
    }

    #[test]
    fn technical_terms_match_case_insensitively() {
        let text = "gradient descent converges. GRADIENT DESCENT with momentum.";
        let concepts = extract_fallback_concepts(text);
        assert_eq!(concepts, vec!["Gradient Descent".to_string()]);
    }

    #[test]
    fn ranking_is_by_frequency() {
        let text = "Hash Table a. Hash Table b. Hash Table c. \
                    Binary Search d. Binary Search e.";
        let concepts = extract_fallback_concepts(text);
        assert_eq!(
            concepts,
            vec!["Hash Table".to_string(), "Binary Search".to_string()]
        );
    }

    #[test]
    fn short_terms_are_dropped() {
        // "Ab Cd" repeats but is below the minimum term length.
        let text = "Ab Cd. Ab Cd.";
        let concepts = extract_fallback_concepts(text);
        assert!(concepts.is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Linked List one. Linked List two. quick sort fast. quick sort again.";
        assert_eq!(extract_fallback_concepts(text), extract_fallback_concepts(text));
    }

    #[test]
    fn combined_text_caps_materials_and_content() {
        let long = "x".repeat(5000);
        let materials: Vec<Material> = (0..12)
            .map(|i| Material::new(&format!("Lecture {i}"), &long, "notes"))
            .collect();
        let text = combined_material_text(&materials);
        assert!(text.contains("Lecture 0"));
        assert!(text.contains("Lecture 9"));
        assert!(!text.contains("Lecture 10"));
        // 10 materials, each capped at 1500 chars plus title and separators.
        assert!(text.len() < 10 * (MAX_CONTENT_CHARS + 50));
    }

    #[test]
    fn empty_text_yields_no_concepts() {
        assert!(extract_fallback_concepts("").is_empty());
    }
}
