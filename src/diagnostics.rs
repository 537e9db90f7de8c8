// Non-fatal findings collected during a run

use crate::model::SourceLocation;
use serde::Serialize;

/// Kind of non-fatal finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed docstring structure, degraded gracefully
    DocstringParse,
    /// A reference token matched more than one symbol
    CrossReferenceAmbiguity,
    /// The filter removed every symbol
    EmptyFilterResult,
    /// A selector page matched no symbols
    EmptySelector,
    /// A module was provided by more than one search location
    ShadowedModule,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DiagnosticKind::DocstringParse => "docstring",
            DiagnosticKind::CrossReferenceAmbiguity => "ambiguous reference",
            DiagnosticKind::EmptyFilterResult => "filter",
            DiagnosticKind::EmptySelector => "empty page",
            DiagnosticKind::ShadowedModule => "shadowed module",
        };
        write!(f, "{}", label)
    }
}

/// A single warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Qualified name of the affected symbol
    pub symbol: Option<String>,
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            symbol: None,
            location: None,
            message: message.into(),
        }
    }

    /// Attach the affected symbol
    pub fn for_symbol(mut self, qualified_name: &str, location: &SourceLocation) -> Self {
        self.symbol = Some(qualified_name.to_string());
        self.location = Some(location.clone());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.kind)?;
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        if let Some(symbol) = &self.symbol {
            write!(f, "{}: ", symbol)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Accumulated warnings, returned alongside successful output
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Warnings attached to one symbol
    pub fn for_symbol<'a>(&'a self, qualified_name: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries
            .iter()
            .filter(move |d| d.symbol.as_deref() == Some(qualified_name))
    }
}
