//! Shared types for the concept-mastery core.

use serde::{Deserialize, Serialize};

/// A piece of course material as provided by the materials collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub title: String,
    pub content: String,
    pub material_type: String,
}

impl Material {
    pub fn new(title: &str, content: &str, material_type: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            material_type: material_type.to_string(),
        }
    }
}
