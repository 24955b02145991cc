//! Core concept-mastery library shared by the tutoring backend.
//!
//! Provides:
//! - Concept filter (stopword/heuristic gate for candidate concepts)
//! - Concept detection in free text (exact and significant-word overlap)
//! - Mastery scoring state machine (confidence-weighted quiz accuracy)
//! - Deterministic fallback concept extraction from material text
//! - Resilient parsing of sectioned assistant replies

pub mod detection;
pub mod extraction;
pub mod filter;
pub mod mastery;
pub mod reply;
pub mod types;

pub use detection::{detect_concepts, detect_concepts_with, ConceptMatcher, OverlapMatcher};
pub use extraction::{combined_material_text, extract_fallback_concepts};
pub use filter::is_valid_concept;
pub use mastery::{confidence_factor, ConceptMastery, Interaction};
pub use reply::{parse_reply, ConceptLink, Reply, StructuredReply};
pub use types::Material;
