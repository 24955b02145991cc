//! Concept extraction from course materials.
//!
//! Primary path asks the classification service for domain concepts; any
//! failure degrades to the deterministic heuristic in mastery-core. The
//! caller never sees an error from extraction.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use tracing::warn;

use mastery_core::extraction::{combined_material_text, extract_fallback_concepts, MAX_CONCEPTS};
use mastery_core::types::Material;

use super::classifier::{parse_string_array, ClassifierClient, ClassifierError};

/// Prompt text cap, in characters.
const MAX_PROMPT_CHARS: usize = 4000;

const EXTRACTION_SYSTEM_PROMPT: &str = "\
You are a concept extractor for educational content.

Extract 10-15 KEY CONCEPTS from the course materials provided.

GOOD CONCEPTS (domain-specific, meaningful):
- \"Machine Learning\", \"Supervised Learning\", \"Neural Networks\"
- \"Binary Search Tree\", \"Hash Table\", \"Linked List\"
- \"Gradient Descent\", \"Backpropagation\", \"Overfitting\"

BAD CONCEPTS (too generic, not useful):
- \"Data\", \"Training\", \"Testing\", \"What\", \"How\", \"Course\"
- \"Introduction\", \"Overview\", \"Example\", \"Chapter\"

Focus on:
- Technical terms and methodologies
- Specific algorithms, data structures, or techniques
- Multi-word concepts (2-4 words)

Return ONLY a JSON array of concepts:
[\"Concept 1\", \"Concept 2\", \"Concept 3\", ...]";

/// Generic terms screened out of classifier output. Smaller than the full
/// concept filter but consistent with it.
static EXTRACTION_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "data", "training", "testing", "what", "how", "course", "introduction", "overview",
        "example", "chapter", "student", "professor", "learning", "understanding", "information",
        "system", "process", "method", "approach", "concept", "topic", "subject", "material",
        "content",
    ]
    .into_iter()
    .collect()
});

/// Extract up to fifteen concepts from the given materials.
pub async fn extract_concepts(
    classifier: &ClassifierClient,
    materials: &[Material],
) -> Vec<String> {
    let text = combined_material_text(materials);
    if text.trim().is_empty() {
        return Vec::new();
    }

    match extract_via_classifier(classifier, &text).await {
        Ok(concepts) => concepts,
        Err(err) => {
            warn!(error = %err, "concept extraction degraded to heuristic fallback");
            extract_fallback_concepts(&text)
        }
    }
}

async fn extract_via_classifier(
    classifier: &ClassifierClient,
    text: &str,
) -> Result<Vec<String>, ClassifierError> {
    let prompt_text: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    let user_prompt = format!(
        "Course materials:\n{prompt_text}\n\n\
         Extract the key technical concepts from these materials. Return as a JSON array."
    );

    let reply = classifier
        .complete(EXTRACTION_SYSTEM_PROMPT, &user_prompt)
        .await?;

    let concepts = parse_string_array(&reply)?
        .into_iter()
        .filter(|concept| passes_extraction_stopwords(concept))
        .take(MAX_CONCEPTS)
        .collect();

    Ok(concepts)
}

/// Inline stopword pass over classifier output.
fn passes_extraction_stopwords(candidate: &str) -> bool {
    let lowered = candidate.to_lowercase();

    candidate.chars().count() > 3
        && !EXTRACTION_STOPWORDS.contains(lowered.as_str())
        && !lowered
            .split_whitespace()
            .any(|word| word.len() < 8 && EXTRACTION_STOPWORDS.contains(word))
}
