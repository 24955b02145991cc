//! Resilient parsing of sectioned assistant replies.
//!
//! Teaching-style replies are requested in a fixed sectioned layout
//! (`KEY_TOPICS:`, `CONCEPT_CONNECTIONS:`, `EXPLANATION:`, `SOURCES:`).
//! The service producing them does not always comply, so parsing degrades to
//! a raw variant that preserves the full text instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A directed relationship between two concepts, as stated by the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptLink {
    pub source: String,
    pub target: String,
    pub relationship: String,
}

/// Successfully parsed sectioned reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredReply {
    pub key_topics: Vec<String>,
    pub connections: Vec<ConceptLink>,
    pub markdown: String,
    pub sources: Vec<String>,
    /// Original text, kept for callers that need the unparsed reply.
    pub raw: String,
}

/// Outcome of parsing a reply: either the structured sections, or the raw
/// text when no recognizable structure was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Structured(StructuredReply),
    Raw(String),
}

impl Reply {
    /// The display content: the explanation section when structured,
    /// otherwise the whole reply.
    pub fn markdown(&self) -> &str {
        match self {
            Self::Structured(reply) => &reply.markdown,
            Self::Raw(text) => text,
        }
    }

    pub fn key_topics(&self) -> &[String] {
        match self {
            Self::Structured(reply) => &reply.key_topics,
            Self::Raw(_) => &[],
        }
    }
}

static TOPICS_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)KEY_TOPICS:\s*(.*?)\s*(?:CONCEPT_CONNECTIONS:|EXPLANATION:|SOURCES:|$)")
        .expect("valid regex")
});
static CONNECTIONS_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)CONCEPT_CONNECTIONS:\s*(.*?)\s*(?:EXPLANATION:|SOURCES:|$)")
        .expect("valid regex")
});
static EXPLANATION_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)EXPLANATION:\s*(.*?)\s*(?:SOURCES:|$)").expect("valid regex"));
static SOURCES_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)SOURCES:\s*(.*)$").expect("valid regex"));
static LIST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*\d.]+\s*").expect("valid regex"));

/// Parse a sectioned reply. Never fails: a reply without a recognizable
/// explanation section comes back as [`Reply::Raw`] with the text preserved.
pub fn parse_reply(raw: &str) -> Reply {
    let markdown = match EXPLANATION_SECTION
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    {
        Some(explanation) => explanation.to_string(),
        None => return Reply::Raw(raw.to_string()),
    };

    let key_topics = TOPICS_SECTION
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| parse_list_items(m.as_str()))
        .unwrap_or_default();

    let connections = CONNECTIONS_SECTION
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| parse_connections(m.as_str()))
        .unwrap_or_default();

    let sources = SOURCES_SECTION
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| parse_list_items(m.as_str()))
        .unwrap_or_default();

    Reply::Structured(StructuredReply {
        key_topics,
        connections,
        markdown,
        sources,
        raw: raw.to_string(),
    })
}

/// Extract bullet or numbered list items, stripping their markers.
fn parse_list_items(section: &str) -> Vec<String> {
    section
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with('-')
                || line.starts_with('*')
                || line.chars().next().is_some_and(|c| c.is_ascii_digit())
        })
        .map(|line| LIST_PREFIX.replace(line, "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse `A -> B: relationship` lines.
fn parse_connections(section: &str) -> Vec<ConceptLink> {
    section
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (source, rest) = line.split_once("->")?;
            let (target, relationship) = match rest.split_once(':') {
                Some((target, relationship)) => (target, relationship.trim()),
                None => (rest, "relates to"),
            };
            Some(ConceptLink {
                source: source.trim().to_string(),
                target: target.trim().to_string(),
                relationship: relationship.to_string(),
            })
        })
        .collect()
}
