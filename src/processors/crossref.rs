// Cross-reference resolution

use super::{parse_options, Processor};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::model::*;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

pub const NAME: &str = "crossref";

/// `ident(.ident)*`
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*").unwrap());

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CrossRefOptions {}

/// Outcome of looking up a token
#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a str),
    Ambiguous(&'a [String]),
    Missing,
}

/// Qualified names of a tree, indexed by every dotted suffix
#[derive(Debug, Default)]
pub struct SymbolIndex {
    names: HashSet<String>,
    suffixes: HashMap<String, Vec<String>>,
}

impl SymbolIndex {
    pub fn new(tree: &SymbolTree) -> Self {
        let mut index = Self::default();
        for name in tree.qualified_names() {
            index.names.insert(name.to_string());
            for (i, _) in name.match_indices('.') {
                index
                    .suffixes
                    .entry(name[i + 1..].to_string())
                    .or_default()
                    .push(name.to_string());
            }
        }
        index
    }

    /// Exact match first, then a unique `.token` suffix
    pub fn lookup(&self, token: &str) -> Lookup<'_> {
        if let Some(name) = self.names.get(token) {
            return Lookup::Found(name);
        }
        match self.suffixes.get(token).map(Vec::as_slice) {
            Some([only]) => Lookup::Found(only),
            Some(many) if !many.is_empty() => Lookup::Ambiguous(many),
            _ => Lookup::Missing,
        }
    }
}

/// Resolves reference-shaped tokens in docstrings and annotations
#[derive(Debug, Default)]
pub struct CrossRefProcessor;

impl CrossRefProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn from_options(options: &toml::Table) -> Result<Self> {
        let _: CrossRefOptions = parse_options(NAME, options)?;
        Ok(Self)
    }
}

impl Processor for CrossRefProcessor {
    fn name(&self) -> &str {
        NAME
    }

    fn must_follow(&self) -> &[&str] {
        &["filter", "google"]
    }

    fn process(&self, tree: &mut SymbolTree, diagnostics: &mut Diagnostics) -> Result<()> {
        let index = SymbolIndex::new(tree);
        tree.for_each_mut(|symbol| {
            symbol.references = scan_symbol(symbol, &index, diagnostics);
        });
        Ok(())
    }
}

/// Every text field of a symbol that may hold references, with an annotation flag
pub fn text_fields(symbol: &Symbol) -> Vec<(TextField, &str, bool)> {
    let mut fields = Vec::new();

    match &symbol.docstring {
        Some(Docstring::Raw(text)) => fields.push((TextField::Summary, text.as_str(), false)),
        Some(Docstring::Structured(doc)) => {
            fields.push((TextField::Summary, doc.summary.as_str(), false));
            for (s, section) in doc.sections.iter().enumerate() {
                match &section.body {
                    SectionBody::Text(text) => {
                        fields.push((TextField::SectionText { section: s }, text.as_str(), false))
                    }
                    SectionBody::Entries(entries) => {
                        for (e, entry) in entries.iter().enumerate() {
                            if let Some(ty) = &entry.type_name {
                                fields.push((TextField::EntryType { section: s, entry: e }, ty.as_str(), true));
                            }
                            fields.push((
                                TextField::EntryDescription { section: s, entry: e },
                                entry.description.as_str(),
                                false,
                            ));
                        }
                    }
                }
            }
        }
        None => {}
    }

    if let Some(signature) = symbol.signature() {
        for (p, param) in signature.parameters.iter().enumerate() {
            if let Some(annotation) = &param.annotation {
                fields.push((TextField::ParameterAnnotation { parameter: p }, annotation.as_str(), true));
            }
        }
        if let Some(ret) = &signature.return_annotation {
            fields.push((TextField::ReturnAnnotation, ret.as_str(), true));
        }
    }

    fields
}

/// Byte ranges enclosed by backtick pairs (inclusive of the backticks)
pub fn backtick_spans(text: &str) -> Vec<(usize, usize)> {
    let ticks: Vec<usize> = text.match_indices('`').map(|(i, _)| i).collect();
    ticks.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

fn scan_symbol(symbol: &Symbol, index: &SymbolIndex, diagnostics: &mut Diagnostics) -> Vec<CrossReference> {
    let mut references = Vec::new();

    for (field, text, annotation) in text_fields(symbol) {
        let spans = backtick_spans(text);

        for m in TOKEN.find_iter(text) {
            let token = m.as_str();
            let dotted = token.contains('.');
            let backticked = spans.iter().any(|&(open, close)| m.start() > open && m.end() <= close);
            let candidate = dotted
                || backticked
                || annotation
                || token.contains('_')
                || token.starts_with(|c: char| c.is_uppercase());
            if !candidate {
                continue;
            }

            let mut reference = CrossReference::new(token, &symbol.qualified_name, field, m.start());
            match index.lookup(token) {
                Lookup::Found(target) => reference.resolve(target),
                Lookup::Ambiguous(matches) => {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::CrossReferenceAmbiguity,
                            format!("'{}' could refer to {}", token, matches.join(", ")),
                        )
                        .for_symbol(&symbol.qualified_name, &symbol.location),
                    );
                }
                Lookup::Missing if dotted || backticked => {}
                Lookup::Missing => continue,
            }
            references.push(reference);
        }
    }

    references
}
