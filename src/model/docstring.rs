// Structured docstring types
//
// The google processor parses raw docstrings into these; `to_docstring`
// prints them back in the same dialect.

use serde::{Deserialize, Serialize};

/// Section kind from the fixed Google-style vocabulary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Args,
    Returns,
    Raises,
    Yields,
    Examples,
    Attributes,
    Notes,
    /// Any header outside the vocabulary, kept verbatim
    Other,
}

impl SectionKind {
    /// Map a header (without the colon) to a known kind
    pub fn from_header(header: &str) -> Option<Self> {
        let kind = match header.trim().to_lowercase().as_str() {
            "args" | "arguments" | "parameters" | "params" | "keyword args" | "keyword arguments" => {
                SectionKind::Args
            }
            "returns" | "return" => SectionKind::Returns,
            "raises" | "raise" => SectionKind::Raises,
            "yields" | "yield" => SectionKind::Yields,
            "examples" | "example" => SectionKind::Examples,
            "attributes" => SectionKind::Attributes,
            "notes" | "note" => SectionKind::Notes,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the body is a list of entries rather than free text
    pub fn has_entries(&self) -> bool {
        matches!(
            self,
            SectionKind::Args
                | SectionKind::Returns
                | SectionKind::Raises
                | SectionKind::Yields
                | SectionKind::Attributes
        )
    }

    /// Whether entries start with a parameter name (`name (type): ...`)
    pub fn has_named_entries(&self) -> bool {
        matches!(self, SectionKind::Args | SectionKind::Attributes)
    }

    /// Heading used when rendering
    pub fn display_title(&self) -> &'static str {
        match self {
            SectionKind::Args => "Arguments",
            SectionKind::Returns => "Returns",
            SectionKind::Raises => "Raises",
            SectionKind::Yields => "Yields",
            SectionKind::Examples => "Examples",
            SectionKind::Attributes => "Attributes",
            SectionKind::Notes => "Notes",
            SectionKind::Other => "Other",
        }
    }
}

/// One `(name, type, description)` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocEntry {
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub description: String,
}

impl DocEntry {
    pub fn new(name: Option<&str>, type_name: Option<&str>, description: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            type_name: type_name.map(str::to_string),
            description: description.to_string(),
        }
    }

    /// Append a continuation line to the description
    pub fn push_line(&mut self, line: &str) {
        if self.description.is_empty() {
            self.description.push_str(line);
        } else {
            self.description.push('\n');
            self.description.push_str(line);
        }
    }

    /// First line as written in the docstring dialect
    fn head(&self, named: bool) -> String {
        let first_line = self.description.lines().next().unwrap_or("");
        let head = match (&self.name, &self.type_name) {
            (Some(name), Some(ty)) => format!("{} ({}): {}", name, ty, first_line),
            (Some(name), None) => format!("{}: {}", name, first_line),
            (None, Some(ty)) if !named => format!("{}: {}", ty, first_line),
            _ => first_line.to_string(),
        };
        head.trim_end().to_string()
    }
}

/// Body of a section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SectionBody {
    Entries(Vec<DocEntry>),
    Text(String),
}

impl SectionBody {
    pub fn is_empty(&self) -> bool {
        match self {
            SectionBody::Entries(entries) => entries.is_empty(),
            SectionBody::Text(text) => text.is_empty(),
        }
    }
}

/// A docstring section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    /// Header text as written, without the colon
    pub title: String,
    pub body: SectionBody,
}

impl Section {
    pub fn new(kind: SectionKind, title: &str) -> Self {
        let body = if kind.has_entries() {
            SectionBody::Entries(Vec::new())
        } else {
            SectionBody::Text(String::new())
        };
        Self {
            kind,
            title: title.to_string(),
            body,
        }
    }

    pub fn entries(&self) -> &[DocEntry] {
        match &self.body {
            SectionBody::Entries(entries) => entries,
            SectionBody::Text(_) => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            SectionBody::Text(text) => Some(text),
            SectionBody::Entries(_) => None,
        }
    }
}

/// A docstring parsed into summary and sections
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StructuredDocstring {
    /// Free text outside any section
    pub summary: String,
    /// Sections in first-occurrence order
    pub sections: Vec<Section>,
}

impl StructuredDocstring {
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty() && self.sections.is_empty()
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Pretty-print in the Google dialect
    ///
    /// Without a summary the output opens with a blank line, so the first
    /// header never sits on the opening line.
    pub fn to_docstring(&self) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if !self.summary.is_empty() {
            blocks.push(self.summary.clone());
        }

        for section in &self.sections {
            let mut lines = vec![format!("{}:", section.title)];
            match &section.body {
                SectionBody::Entries(entries) => {
                    let named = section.kind.has_named_entries();
                    for entry in entries {
                        lines.push(format!("    {}", entry.head(named)));
                        for cont in entry.description.lines().skip(1) {
                            if cont.trim().is_empty() {
                                lines.push(String::new());
                            } else {
                                lines.push(format!("        {}", cont));
                            }
                        }
                    }
                }
                SectionBody::Text(text) => {
                    for line in text.lines() {
                        if line.trim().is_empty() {
                            lines.push(String::new());
                        } else {
                            lines.push(format!("    {}", line));
                        }
                    }
                }
            }
            blocks.push(lines.join("\n"));
        }

        let text = blocks.join("\n\n");
        if self.summary.is_empty() && !self.sections.is_empty() {
            format!("\n{}", text)
        } else {
            text
        }
    }
}
