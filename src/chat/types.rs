//! Request-shaping types for the chat client.

use std::path::PathBuf;

use serde_json::Value;

use crate::errors::{Error, Result};

/// Fallback billing tag when normalization strips everything.
pub const UNTAGGED: &str = "untagged";

/// Maximum length of a normalized billing tag.
const MAX_TAG_LEN: usize = 64;

/// Capability tier requested from the model provider.
///
/// The tier picks the model and, at the top tier, the reasoning effort. The
/// mapping is intentionally centralized so call sites express intent
/// ("cheap" vs "best") rather than model names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intelligence {
    Low,
    Medium,
    High,
}

impl Intelligence {
    /// Model identifier sent to the provider.
    pub fn model(&self) -> &'static str {
        match self {
            Intelligence::Low => "gpt-5-mini",
            Intelligence::Medium | Intelligence::High => "gpt-5",
        }
    }

    /// Reasoning effort, set only at the top tier.
    pub fn reasoning_effort(&self) -> Option<&'static str> {
        match self {
            Intelligence::High => Some("high"),
            Intelligence::Low | Intelligence::Medium => None,
        }
    }
}

/// A JSON schema to enforce on the model response.
#[derive(Debug, Clone)]
pub enum ResponseFormat {
    /// Schema supplied inline.
    Schema(Value),
    /// Schema loaded from a file at request time.
    SchemaFile(PathBuf),
}

impl ResponseFormat {
    /// Parse a schema from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let schema: Value = serde_json::from_str(raw)
            .map_err(|e| Error::config(format!("response format is not valid JSON: {e}")))?;
        Ok(ResponseFormat::Schema(schema))
    }

    /// Resolve the schema value, reading the file variant from disk.
    ///
    /// A missing file or unparsable content is a hard error; silently
    /// dropping the schema would hand unvalidated output to callers that
    /// asked for structure.
    pub fn load(&self) -> Result<Value> {
        match self {
            ResponseFormat::Schema(value) => Ok(value.clone()),
            ResponseFormat::SchemaFile(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!(
                        "response format file '{}' could not be read: {e}",
                        path.display()
                    ))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    Error::config(format!(
                        "response format file '{}' is not valid JSON: {e}",
                        path.display()
                    ))
                })
            }
        }
    }
}

/// Normalize an arbitrary tag into a safe billing identifier.
///
/// Lowercased ascii, whitespace collapsed to underscores, restricted to
/// `[a-z0-9_-]`, truncated to 64 characters. An empty result falls back to
/// `untagged` so usage always aggregates under some key.
pub fn normalize_tag(value: &str) -> String {
    let collapsed = value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let filtered: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .take(MAX_TAG_LEN)
        .collect();

    if filtered.is_empty() {
        UNTAGGED.to_string()
    } else {
        filtered
    }
}
