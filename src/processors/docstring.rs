// Google-style docstring structure parsing
//
// Line oriented and indentation sensitive. Parsing never fails: malformed
// structure is folded into the nearest section and reported as a warning.

use super::{parse_options, Processor};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::model::*;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

pub const NAME: &str = "google";

const TAB_SIZE: usize = 8;

/// `name (type): description` or `name: description`
static NAMED_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*{0,2}[A-Za-z_][A-Za-z0-9_]*)(?:\s*\((.*?)\))?\s*:(?:\s+(.*))?$").unwrap()
});

/// A line made of words followed by a colon
static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_ -]*?)\s*:$").unwrap());

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GoogleOptions {}

/// Parses raw docstrings into sections
#[derive(Debug, Default)]
pub struct GoogleProcessor;

impl GoogleProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn from_options(options: &toml::Table) -> Result<Self> {
        let _: GoogleOptions = parse_options(NAME, options)?;
        Ok(Self)
    }
}

impl Processor for GoogleProcessor {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&self, tree: &mut SymbolTree, diagnostics: &mut Diagnostics) -> Result<()> {
        tree.for_each_mut(|symbol| {
            let Some(Docstring::Raw(raw)) = &symbol.docstring else {
                return;
            };

            let parsed = parse_docstring(raw);
            for warning in parsed.warnings {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::DocstringParse,
                        format!("docstring line {}: {}", warning.line, warning.message),
                    )
                    .for_symbol(&symbol.qualified_name, &symbol.location),
                );
            }
            symbol.docstring = Some(Docstring::Structured(parsed.docstring));
        });
        Ok(())
    }
}

/// A malformed line found while parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    /// 1-based line in the normalised docstring
    pub line: usize,
    pub message: String,
}

/// Result of parsing one docstring
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocstring {
    pub docstring: StructuredDocstring,
    pub warnings: Vec<ParseWarning>,
}

/// Normalise docstring indentation like Python's `inspect.cleandoc`
pub fn cleandoc(text: &str) -> String {
    let expanded: Vec<String> = text.lines().map(expand_tabs).collect();

    let margin = expanded
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation(l))
        .min()
        .unwrap_or(0);

    let mut lines: Vec<String> = expanded
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim_start().to_string()
            } else if line.len() >= margin && line.is_char_boundary(margin) {
                line[margin..].to_string()
            } else {
                line.trim_start().to_string()
            }
        })
        .collect();

    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }
    let first = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    lines.drain(..first);

    lines.join("\n")
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_SIZE - column % TAB_SIZE;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Title of a header line, without the colon
fn header_title(line: &str) -> Option<&str> {
    HEADER
        .captures(line.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Whether text reads as a type expression (`int`, `Optional[Dict[str, int]]`, `a.B | None`)
fn looks_like_type(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    if !chars.first().map_or(false, |c| c.is_alphabetic() || *c == '_') {
        return false;
    }

    let mut depth = 0i32;
    for (i, c) in chars.iter().enumerate() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            c if c.is_whitespace() => {
                if depth == 0 {
                    let prev = chars[..i].iter().rev().find(|c| !c.is_whitespace());
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if prev != Some(&'|') && next != Some(&'|') && prev != Some(&',') {
                        return false;
                    }
                }
            }
            c if c.is_alphanumeric() || "_.,|'\"".contains(*c) => {}
            _ => return false,
        }
    }
    depth == 0
}

/// Split `type: description` at the first colon outside brackets
fn split_typed(line: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in line.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ':' if depth == 0 => {
                let rest = &line[i + 1..];
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return None;
                }
                let ty = line[..i].trim();
                return looks_like_type(ty).then_some((ty, rest.trim()));
            }
            _ => {}
        }
    }
    None
}

/// Parse the first line of an entry, if it is one
fn parse_entry(kind: SectionKind, line: &str) -> Option<DocEntry> {
    if kind.has_named_entries() {
        let caps = NAMED_ENTRY.captures(line)?;
        let name = caps.get(1).map(|m| m.as_str());
        let ty = caps.get(2).map(|m| m.as_str().trim()).filter(|t| !t.is_empty());
        let description = caps.get(3).map_or("", |m| m.as_str().trim_end());
        Some(DocEntry::new(name, ty, description))
    } else {
        let (ty, description) = split_typed(line)?;
        Some(DocEntry::new(None, Some(ty), description))
    }
}

#[derive(Debug)]
struct OpenSection {
    index: usize,
    header_indent: usize,
    body_indent: Option<usize>,
    entry: Option<usize>,
    pending_blanks: usize,
}

#[derive(Debug, Default)]
struct ParserState {
    summary: Vec<String>,
    summary_blanks: usize,
    sections: Vec<Section>,
    open: Option<OpenSection>,
    warnings: Vec<ParseWarning>,
}

impl ParserState {
    fn warn(&mut self, line: usize, message: String) {
        self.warnings.push(ParseWarning { line, message });
    }

    fn blank(&mut self) {
        match self.open.as_mut() {
            Some(open) => open.pending_blanks += 1,
            None => self.summary_blanks += 1,
        }
    }

    fn summary_line(&mut self, line: &str) {
        if !self.summary.is_empty() {
            for _ in 0..self.summary_blanks {
                self.summary.push(String::new());
            }
        }
        self.summary_blanks = 0;
        self.summary.push(line.trim_end().to_string());
    }

    /// Open a section, reusing an earlier one of the same kind and title
    fn open_section(&mut self, kind: SectionKind, title: &str, header_indent: usize) {
        let existing = self
            .sections
            .iter()
            .position(|s| s.kind == kind && (kind != SectionKind::Other || s.title == title));

        let (index, pending_blanks) = match existing {
            Some(index) => {
                let separate = matches!(&self.sections[index].body, SectionBody::Text(t) if !t.is_empty());
                (index, usize::from(separate))
            }
            None => {
                self.sections.push(Section::new(kind, title));
                (self.sections.len() - 1, 0)
            }
        };

        self.open = Some(OpenSection {
            index,
            header_indent,
            body_indent: None,
            entry: None,
            pending_blanks,
        });
    }

    fn close_section(&mut self) {
        if let Some(open) = self.open.take() {
            self.summary_blanks = open.pending_blanks.max(1);
        }
    }

    /// A non-blank line indented deeper than the open section's header
    fn section_line(&mut self, line: &str, indent: usize, number: usize) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let body_indent = *open.body_indent.get_or_insert(indent);
        let section = &mut self.sections[open.index];
        let text = line.trim();

        if indent < body_indent {
            self.warnings.push(ParseWarning {
                line: number,
                message: format!("inconsistent indentation in section '{}'", section.title),
            });
            append_line(section, open, text);
            return;
        }

        match &mut section.body {
            SectionBody::Text(body) => {
                if !body.is_empty() {
                    for _ in 0..open.pending_blanks {
                        body.push('\n');
                    }
                    body.push('\n');
                }
                body.push_str(line[body_indent..].trim_end());
                open.pending_blanks = 0;
            }
            SectionBody::Entries(entries) => {
                if indent == body_indent {
                    if let Some(entry) = parse_entry(section.kind, text) {
                        entries.push(entry);
                        open.entry = Some(entries.len() - 1);
                        open.pending_blanks = 0;
                        return;
                    }
                    if section.kind.has_named_entries() {
                        self.warnings.push(ParseWarning {
                            line: number,
                            message: format!("expected an entry in section '{}'", section.title),
                        });
                    }
                }
                append_line(section, open, text);
            }
        }
    }

    fn finish(mut self) -> ParsedDocstring {
        self.open = None;
        ParsedDocstring {
            docstring: StructuredDocstring {
                summary: self.summary.join("\n"),
                sections: self.sections,
            },
            warnings: self.warnings,
        }
    }
}

/// Append text to the current entry (or a new bare one) or to the section text
fn append_line(section: &mut Section, open: &mut OpenSection, text: &str) {
    match &mut section.body {
        SectionBody::Entries(entries) => match open.entry.and_then(|i| entries.get_mut(i)) {
            Some(entry) => {
                for _ in 0..open.pending_blanks {
                    entry.push_line("");
                }
                entry.push_line(text);
            }
            None => {
                entries.push(DocEntry::new(None, None, text));
                open.entry = Some(entries.len() - 1);
            }
        },
        SectionBody::Text(body) => {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(text);
        }
    }
    open.pending_blanks = 0;
}

/// `cleandoc`, except that a header on the opening line counts towards the
/// margin so its body stays indented below it
fn normalise(raw: &str) -> String {
    let first = raw.lines().next().unwrap_or("");
    if header_title(first).is_some() {
        cleandoc(&format!("\n{}{}", first.trim_start(), &raw[first.len()..]))
    } else {
        cleandoc(raw)
    }
}

/// Parse a raw docstring in the Google dialect
pub fn parse_docstring(raw: &str) -> ParsedDocstring {
    let text = normalise(raw);
    let lines: Vec<&str> = text.lines().collect();
    let mut state = ParserState::default();

    for (i, line) in lines.iter().enumerate() {
        let number = i + 1;
        if line.trim().is_empty() {
            state.blank();
            continue;
        }

        let indent = indentation(line);
        if let Some(open) = &state.open {
            if indent > open.header_indent {
                state.section_line(line, indent, number);
                continue;
            }
            state.close_section();
        }

        if let Some(title) = header_title(line) {
            let body_follows = lines[i + 1..]
                .iter()
                .find(|l| !l.trim().is_empty())
                .map_or(false, |next| indentation(next) > indent);

            match SectionKind::from_header(title) {
                Some(kind) if body_follows => {
                    state.open_section(kind, title, indent);
                    continue;
                }
                Some(_) => state.warn(number, format!("section '{}' has no body", title)),
                None if body_follows => {
                    state.open_section(SectionKind::Other, title, indent);
                    continue;
                }
                None => {}
            }
        }

        state.summary_line(line);
    }

    state.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> StructuredDocstring {
        parse_docstring(raw).docstring
    }

    #[test]
    fn test_cleandoc() {
        assert_eq!(cleandoc("  First.\n\n    Body\n      nested\n    "), "First.\n\nBody\n  nested");
        assert_eq!(cleandoc("\n\n    Only body.\n"), "Only body.");
        assert_eq!(cleandoc("One\n\tTabbed"), "One\nTabbed");
        assert_eq!(cleandoc(""), "");
    }

    #[test]
    fn test_looks_like_type() {
        assert!(looks_like_type("int"));
        assert!(looks_like_type("Optional[Dict[str, int]]"));
        assert!(looks_like_type("yfs.quote.Quote"));
        assert!(looks_like_type("str | None"));
        assert!(!looks_like_type("The value"));
        assert!(!looks_like_type("Note that"));
        assert!(!looks_like_type("List[int"));
        assert!(!looks_like_type(""));
    }

    #[test]
    fn test_summary_only() {
        let doc = parse("Get a page.\n\n    More detail here.\n    ");
        assert_eq!(doc.summary, "Get a page.\n\nMore detail here.");
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_sections() {
        let raw = r#"Get summary page data.

        Args:
            symbol (str): Ticker symbol.
            use_fuzzy_search (bool): If True does a symbol check validation
                prior to requesting summary page data.
            page_not_found_ok: If True returns None.
            *args: Extra positional arguments.

        Returns:
            Optional[SummaryPage]: Summary page data.

        Raises:
            AttributeError: When a page is not found.
            ValueError: When the symbol is empty.
        "#;
        let doc = parse(raw);
        assert_eq!(doc.summary, "Get summary page data.");
        assert_eq!(doc.sections.len(), 3);

        let args = doc.section(SectionKind::Args).unwrap();
        assert_eq!(args.title, "Args");
        let entries = args.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], DocEntry::new(Some("symbol"), Some("str"), "Ticker symbol."));
        assert_eq!(
            entries[1].description,
            "If True does a symbol check validation\nprior to requesting summary page data."
        );
        assert_eq!(entries[2].type_name, None);
        assert_eq!(entries[3].name.as_deref(), Some("*args"));

        let returns = doc.section(SectionKind::Returns).unwrap().entries();
        assert_eq!(returns, &[DocEntry::new(None, Some("Optional[SummaryPage]"), "Summary page data.")]);

        let raises = doc.section(SectionKind::Raises).unwrap().entries();
        assert_eq!(raises.len(), 2);
        assert_eq!(raises[1].type_name.as_deref(), Some("ValueError"));
    }

    #[test]
    fn test_header_aliases() {
        let doc = parse("Do it.\n\nParameters:\n    x: The x.\n\nReturn:\n    The result.");
        assert_eq!(doc.sections[0].kind, SectionKind::Args);
        assert_eq!(doc.sections[0].title, "Parameters");
        assert_eq!(doc.sections[1].kind, SectionKind::Returns);
        assert_eq!(doc.sections[1].entries(), &[DocEntry::new(None, None, "The result.")]);
    }

    #[test]
    fn test_bare_returns_continue() {
        let doc = parse("Returns:\n    The page, or None\n    when missing.");
        let entries = doc.section(SectionKind::Returns).unwrap().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "The page, or None\nwhen missing.");
    }

    #[test]
    fn test_dedented_prose_after_returns_lands_in_summary() {
        let raw = "Summary.\n\nReturns:\n    int: A value.\n\nTrailing prose.";
        let parsed = parse_docstring(raw);
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.docstring.summary, "Summary.\n\nTrailing prose.");
        assert_eq!(parsed.docstring.sections.len(), 1);
        assert_eq!(parsed.docstring.sections[0].entries().len(), 1);
    }

    #[test]
    fn test_blank_lines_do_not_close_sections() {
        let raw = "Attributes:\n    symbol (str): Ticker\n\n    quote (Quote): Quote header.\n";
        let doc = parse(raw);
        assert!(doc.summary.is_empty());
        assert_eq!(doc.sections[0].entries().len(), 2);
    }

    #[test]
    fn test_text_sections() {
        let raw = "Examples:\n    >>> page = get_summary_page(\"AAPL\")\n    >>> if page:\n    ...     print(page)\n\n    Done.\n\nNotes:\n    A note.";
        let doc = parse(raw);
        assert_eq!(
            doc.section(SectionKind::Examples).unwrap().text(),
            Some(">>> page = get_summary_page(\"AAPL\")\n>>> if page:\n...     print(page)\n\nDone.")
        );
        assert_eq!(doc.section(SectionKind::Notes).unwrap().text(), Some("A note."));
    }

    #[test]
    fn test_unknown_header_needs_indented_body() {
        let doc = parse("Summary.\n\nWarning:\n    Slow.\n\nSee also:\nnothing here");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].kind, SectionKind::Other);
        assert_eq!(doc.sections[0].title, "Warning");
        assert_eq!(doc.sections[0].text(), Some("Slow."));
        assert_eq!(doc.summary, "Summary.\n\nSee also:\nnothing here");
    }

    #[test]
    fn test_repeated_header_appends() {
        let doc = parse("Args:\n    a: First.\n\nReturns:\n    int: R.\n\nArgs:\n    b: Second.");
        assert_eq!(doc.sections.len(), 2);
        let args = doc.section(SectionKind::Args).unwrap().entries();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_known_header_without_body_warns() {
        let parsed = parse_docstring("Summary.\n\nReturns:\n");
        assert!(parsed.docstring.sections.is_empty());
        assert_eq!(parsed.docstring.summary, "Summary.\n\nReturns:");
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].line, 3);
    }

    #[test]
    fn test_non_entry_args_line_warns() {
        let parsed = parse_docstring("Args:\n    symbol (str): Ticker.\n    this line is not an entry\n");
        let entries = parsed.docstring.sections[0].entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "Ticker.\nthis line is not an entry");
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].line, 3);
    }

    #[test]
    fn test_inconsistent_indentation_warns() {
        let parsed = parse_docstring("Summary.\n    Args:\n            a: First.\n        b: Second.\n");
        let entries = parsed.docstring.sections[0].entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "First.\nb: Second.");
        assert_eq!(parsed.warnings[0].line, 4);
    }

    #[test]
    fn test_entry_description_on_next_line() {
        let doc = parse("Args:\n    symbol (str):\n        Ticker symbol.\n");
        assert_eq!(doc.sections[0].entries()[0].description, "Ticker symbol.");
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let raw = r#"Data scraped from the yahoo finance summary page.

    Attributes:
        symbol (str): Ticker Symbol
        name (str): Ticker Name

        quote (Quote): Quote header section of the page.
            Spans two lines.

    Notes:
        This class inherits from the pydantic BaseModel.

        .json(): Serialize to a JSON object.

    Returns:
        Optional[SummaryPage]: The page.
        Continued bare line.

    Custom Header:
        Kept verbatim.

    Closing prose.
    "#;
        let first = parse(raw);
        let second = parse(&first.to_docstring());
        assert_eq!(first, second);
        assert_eq!(first.to_docstring(), second.to_docstring());
    }

    #[test]
    fn test_header_on_opening_line() {
        let parsed = parse_docstring("Returns:\n        int: A value.\n    ");
        assert!(parsed.warnings.is_empty());
        assert!(parsed.docstring.summary.is_empty());
        let returns = parsed.docstring.section(SectionKind::Returns).unwrap().entries();
        assert_eq!(returns, &[DocEntry::new(None, Some("int"), "A value.")]);
    }

    #[test]
    fn test_roundtrip_without_summary() {
        let first = parse("\n    Returns:\n        int: A value.\n    ");
        assert!(first.summary.is_empty());
        assert_eq!(first.sections.len(), 1);

        let printed = first.to_docstring();
        let second = parse_docstring(&printed);
        assert!(second.warnings.is_empty());
        assert_eq!(first, second.docstring);
        assert_eq!(printed, second.docstring.to_docstring());
    }

    #[test]
    fn test_processor_structures_raw_docstrings() {
        let mut module = Symbol::module("pkg", SourceLocation::new("pkg/__init__.py", 1));
        module.docstring = Some(Docstring::Raw("Package.\n\nArgs:\n    x: y\n    not an entry".to_string()));
        let mut tree = SymbolTree::new(vec![module]);
        let mut diagnostics = Diagnostics::new();

        GoogleProcessor::new().process(&mut tree, &mut diagnostics).unwrap();

        let doc = tree.modules[0].docstring.as_ref().and_then(|d| d.structured()).unwrap();
        assert_eq!(doc.summary, "Package.");
        let diag = diagnostics.iter().next().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::DocstringParse);
        assert_eq!(diag.symbol.as_deref(), Some("pkg"));
        assert!(diag.message.contains("docstring line 5"));

        // Structured docstrings are left alone on a second run
        let before = tree.clone();
        GoogleProcessor::new().process(&mut tree, &mut Diagnostics::new()).unwrap();
        assert_eq!(tree, before);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let table: toml::Table = toml::from_str("style = \"numpy\"").unwrap();
        assert!(GoogleProcessor::from_options(&table).is_err());
    }
}
