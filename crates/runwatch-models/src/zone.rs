//! Zone identifiers.
//!
//! A zone is entered by a person as free text ("Reading Area") and stored
//! under a canonical identifier (`reading_area`). The display label is
//! reconstructed from the identifier.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected zone name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneNameError {
    #[error("Please enter a zone name")]
    Empty,
}

/// Canonical zone identifier: lower-case, whitespace runs collapsed to `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Canonicalize a user-entered zone name.
    pub fn parse(name: &str) -> Result<Self, ZoneNameError> {
        let canonical = name
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join("_");

        if canonical.is_empty() {
            return Err(ZoneNameError::Empty);
        }
        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title-cased label: `reading_area` → `Reading Area`.
    pub fn label(&self) -> String {
        self.0
            .split('_')
            .map(title_case)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZoneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Externally defined zone names (`GET /api/map/layout`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneLayout {
    pub zones: Vec<String>,
}
