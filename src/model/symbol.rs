// Symbol types for documentable Python entities
//
// A Symbol is produced once by the loader and then mutated in place by the
// processor chain. Everything here is serializable so a tree can be dumped
// as JSON for debugging.

use crate::model::docstring::StructuredDocstring;
use crate::model::reference::CrossReference;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Where a symbol was declared
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// A docstring, raw as loaded or parsed into sections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "form", content = "value", rename_all = "lowercase")]
pub enum Docstring {
    Raw(String),
    Structured(StructuredDocstring),
}

impl Docstring {
    /// The raw text, if this docstring has not been structured yet
    pub fn raw(&self) -> Option<&str> {
        match self {
            Docstring::Raw(text) => Some(text),
            Docstring::Structured(_) => None,
        }
    }

    pub fn structured(&self) -> Option<&StructuredDocstring> {
        match self {
            Docstring::Raw(_) => None,
            Docstring::Structured(doc) => Some(doc),
        }
    }

    /// Whether the docstring carries any text at all
    pub fn is_blank(&self) -> bool {
        match self {
            Docstring::Raw(text) => text.trim().is_empty(),
            Docstring::Structured(doc) => doc.is_empty(),
        }
    }
}

/// Kind of a symbol together with its kind-specific data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Class {
        /// Base classes as written, not resolved
        bases: Vec<String>,
    },
    Function {
        signature: Signature,
    },
    Attribute {
        annotation: Option<String>,
        value: Option<String>,
    },
}

impl SymbolKind {
    /// Short lowercase label for the kind
    pub fn label(&self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Class { .. } => "class",
            SymbolKind::Function { .. } => "function",
            SymbolKind::Attribute { .. } => "attribute",
        }
    }

    pub fn is_module(&self) -> bool {
        matches!(self, SymbolKind::Module)
    }

    pub fn is_class(&self) -> bool {
        matches!(self, SymbolKind::Class { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, SymbolKind::Function { .. })
    }
}

/// One documentable entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symbol {
    /// Name as declared
    pub name: String,
    /// Dot-separated path, unique within a tree
    pub qualified_name: String,
    #[serde(flatten)]
    pub kind: SymbolKind,
    /// Decorator expressions without the leading `@`
    pub decorators: Vec<String>,
    pub docstring: Option<Docstring>,
    /// Members in declaration order
    pub children: Vec<Symbol>,
    pub location: SourceLocation,
    /// Cross references found in this symbol's docstring and signature
    pub references: Vec<CrossReference>,
}

impl Symbol {
    /// Create a symbol below `parent` (or a top-level module when `None`)
    pub fn new(name: &str, parent: Option<&str>, kind: SymbolKind, location: SourceLocation) -> Self {
        let qualified_name = match parent {
            Some(parent) => format!("{}.{}", parent, name),
            None => name.to_string(),
        };
        Self {
            name: name.to_string(),
            qualified_name,
            kind,
            decorators: Vec::new(),
            docstring: None,
            children: Vec::new(),
            location,
            references: Vec::new(),
        }
    }

    /// Create a top-level module from its dotted path
    pub fn module(qualified_name: &str, location: SourceLocation) -> Self {
        let name = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        let mut symbol = Self::new(name, None, SymbolKind::Module, location);
        symbol.qualified_name = qualified_name.to_string();
        symbol
    }

    /// Check if this is a private member (starts with a single _)
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_') && !self.is_special()
    }

    /// Check if this is a special member (__x__)
    pub fn is_special(&self) -> bool {
        self.name.len() > 4 && self.name.starts_with("__") && self.name.ends_with("__")
    }

    pub fn has_docstring(&self) -> bool {
        self.docstring.as_ref().map_or(false, |d| !d.is_blank())
    }

    pub fn signature(&self) -> Option<&Signature> {
        match &self.kind {
            SymbolKind::Function { signature } => Some(signature),
            _ => None,
        }
    }

    /// Check if this is a property
    pub fn is_property(&self) -> bool {
        self.decorators
            .iter()
            .any(|d| d == "property" || d.ends_with(".getter") || d.ends_with("cached_property"))
    }
}

/// A callable's declared signature
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub return_annotation: Option<String>,
    pub is_async: bool,
}

impl Signature {
    /// Render the parameter list, including `/` and `*` separators
    pub fn parameter_list(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let has_var_positional = self.parameters.iter().any(|p| p.kind == ParameterKind::Args);
        let mut keyword_marker_written = false;

        for (i, param) in self.parameters.iter().enumerate() {
            if param.kind == ParameterKind::KeywordOnly && !has_var_positional && !keyword_marker_written {
                parts.push("*".to_string());
                keyword_marker_written = true;
            }
            parts.push(param.to_string());

            let next_is_positional_only = self
                .parameters
                .get(i + 1)
                .map_or(false, |p| p.kind == ParameterKind::PositionalOnly);
            if param.kind == ParameterKind::PositionalOnly && !next_is_positional_only {
                parts.push("/".to_string());
            }
        }

        parts.join(", ")
    }

    /// Format as `name(params) -> ret`
    pub fn format(&self, name: &str, with_return: bool) -> String {
        let ret = match (&self.return_annotation, with_return) {
            (Some(r), true) => format!(" -> {}", r),
            _ => String::new(),
        };
        format!("{}({}){}", name, self.parameter_list(), ret)
    }
}

/// A function parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<String>,
    /// Default value as written
    pub default: Option<String>,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            annotation: None,
            default: None,
            kind: ParameterKind::Regular,
        }
    }

    pub fn with_annotation(name: &str, annotation: &str) -> Self {
        Self {
            annotation: Some(annotation.to_string()),
            ..Self::new(name)
        }
    }

    pub fn with_default(name: &str, default: &str) -> Self {
        Self {
            default: Some(default.to_string()),
            ..Self::new(name)
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();

        match self.kind {
            ParameterKind::Args => s.push('*'),
            ParameterKind::Kwargs => s.push_str("**"),
            _ => {}
        }

        s.push_str(&self.name);

        if let Some(ref t) = self.annotation {
            s.push_str(": ");
            s.push_str(t);
        }

        if let Some(ref d) = self.default {
            if self.annotation.is_some() {
                s.push_str(" = ");
            } else {
                s.push('=');
            }
            s.push_str(d);
        }

        write!(f, "{}", s)
    }
}

/// Kind of function parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParameterKind {
    /// Regular positional or keyword parameter
    Regular,
    /// *args
    Args,
    /// **kwargs
    Kwargs,
    /// Positional-only (before /)
    PositionalOnly,
    /// Keyword-only (after *)
    KeywordOnly,
}

/// The loaded set of top-level modules
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SymbolTree {
    pub modules: Vec<Symbol>,
}

impl SymbolTree {
    pub fn new(modules: Vec<Symbol>) -> Self {
        Self { modules }
    }

    /// All symbols in pre-order (declaration order)
    pub fn walk(&self) -> Vec<&Symbol> {
        self.walk_with_parent().into_iter().map(|(s, _)| s).collect()
    }

    /// All symbols in pre-order, each paired with its parent
    pub fn walk_with_parent(&self) -> Vec<(&Symbol, Option<&Symbol>)> {
        fn visit<'a>(symbol: &'a Symbol, parent: Option<&'a Symbol>, out: &mut Vec<(&'a Symbol, Option<&'a Symbol>)>) {
            out.push((symbol, parent));
            for child in &symbol.children {
                visit(child, Some(symbol), out);
            }
        }

        let mut out = Vec::new();
        for module in &self.modules {
            visit(module, None, &mut out);
        }
        out
    }

    /// Apply `f` to every symbol, parents before children
    pub fn for_each_mut<F: FnMut(&mut Symbol)>(&mut self, mut f: F) {
        fn visit<F: FnMut(&mut Symbol)>(symbol: &mut Symbol, f: &mut F) {
            f(symbol);
            for child in &mut symbol.children {
                visit(child, f);
            }
        }

        for module in &mut self.modules {
            visit(module, &mut f);
        }
    }

    /// Look up a symbol by qualified name
    pub fn find(&self, qualified_name: &str) -> Option<&Symbol> {
        self.walk().into_iter().find(|s| s.qualified_name == qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.find(qualified_name).is_some()
    }

    /// Qualified names in pre-order
    pub fn qualified_names(&self) -> Vec<&str> {
        self.walk().into_iter().map(|s| s.qualified_name.as_str()).collect()
    }

    /// Total number of symbols
    pub fn len(&self) -> usize {
        self.walk().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Verify that qualified names are unique and derived from the parent chain
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();
        for (symbol, parent) in self.walk_with_parent() {
            if !seen.insert(symbol.qualified_name.as_str()) {
                return Err(format!("duplicate qualified name '{}'", symbol.qualified_name));
            }
            match parent {
                Some(parent) => {
                    let expected = format!("{}.{}", parent.qualified_name, symbol.name);
                    if symbol.qualified_name != expected {
                        return Err(format!(
                            "'{}' should be named '{}' under its parent",
                            symbol.qualified_name, expected
                        ));
                    }
                }
                None => {
                    if !symbol.kind.is_module() {
                        return Err(format!("top-level symbol '{}' is not a module", symbol.qualified_name));
                    }
                    if !symbol.qualified_name.ends_with(&symbol.name) {
                        return Err(format!(
                            "module '{}' does not end with its name '{}'",
                            symbol.qualified_name, symbol.name
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
