// Cross references found in docstrings and signatures

use serde::{Deserialize, Serialize};

/// The text field a reference token was found in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum TextField {
    /// The summary, or the whole text of an unstructured docstring
    Summary,
    SectionText { section: usize },
    EntryDescription { section: usize, entry: usize },
    EntryType { section: usize, entry: usize },
    ParameterAnnotation { parameter: usize },
    ReturnAnnotation,
}

/// Resolution state of a reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "target", rename_all = "lowercase")]
pub enum Resolution {
    Unresolved,
    Resolved(String),
}

/// A candidate link from documentation text to another symbol
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossReference {
    /// The token exactly as matched
    pub token: String,
    /// Qualified name of the symbol whose text contains the token
    pub owner: String,
    pub field: TextField,
    /// Byte range of the token inside the field text
    pub start: usize,
    pub end: usize,
    pub resolution: Resolution,
}

impl CrossReference {
    pub fn new(token: &str, owner: &str, field: TextField, start: usize) -> Self {
        Self {
            token: token.to_string(),
            owner: owner.to_string(),
            field,
            start,
            end: start + token.len(),
            resolution: Resolution::Unresolved,
        }
    }

    /// Target qualified name when resolved
    pub fn target(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Resolved(target) => Some(target),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.target().is_some()
    }

    /// Attach a resolved target; the token itself is never touched
    pub fn resolve(&mut self, target: &str) {
        self.resolution = Resolution::Resolved(target.to_string());
    }
}
