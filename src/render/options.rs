// Recognized formatting options

use crate::error::{Error, Result};
use crate::model::{Symbol, SymbolKind};
use serde::{Deserialize, Serialize};

/// Heading depth per symbol kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderLevels {
    pub module: usize,
    pub class: usize,
    pub method: usize,
    pub function: usize,
    pub attribute: usize,
}

impl Default for HeaderLevels {
    fn default() -> Self {
        Self {
            module: 1,
            class: 2,
            method: 4,
            function: 4,
            attribute: 4,
        }
    }
}

impl HeaderLevels {
    /// Level for a symbol, given its parent
    pub fn for_symbol(&self, symbol: &Symbol, parent: Option<&Symbol>) -> usize {
        match &symbol.kind {
            SymbolKind::Module => self.module,
            SymbolKind::Class { .. } => self.class,
            SymbolKind::Function { .. } if parent.map_or(false, |p| p.kind.is_class()) => self.method,
            SymbolKind::Function { .. } => self.function,
            SymbolKind::Attribute { .. } => self.attribute,
        }
    }

    fn validate(&self) -> Result<()> {
        let levels = [
            ("module", self.module),
            ("class", self.class),
            ("method", self.method),
            ("function", self.function),
            ("attribute", self.attribute),
        ];
        for (kind, level) in levels {
            if !(1..=6).contains(&level) {
                return Err(Error::configuration(format!(
                    "header level for {} must be between 1 and 6, got {}",
                    kind, level
                )));
            }
        }
        Ok(())
    }
}

/// Markdown formatting switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Show decorators above the signature
    pub signature_with_decorators: bool,
    /// Inline `-> type` in the signature
    pub signature_with_return_type: bool,
    /// Fence signatures in a code block instead of inline code
    pub signature_code_block: bool,
    /// Prefix function signatures with `def`
    pub signature_with_def: bool,
    /// Render `class Name(bases)` for classes
    pub classdef_code_block: bool,
    /// Render `name: type = value` for attributes
    pub data_code_block: bool,
    /// Emit an HTML anchor named after the qualified name before each heading
    pub insert_header_anchors: bool,
    pub docstrings_as_blockquote: bool,
    /// Class headings read `Name Objects`
    pub descriptive_class_title: bool,
    /// Method headings read `Class.method`
    pub add_method_class_prefix: bool,
    /// Attribute headings read `Class.attr`
    pub add_member_class_prefix: bool,
    pub render_module_header: bool,
    pub render_toc: bool,
    /// Start each symbol page with the page title
    pub render_page_title: bool,
    /// Turn resolved cross references into links
    pub link_references: bool,
    /// Info string on code fences
    pub code_language: String,
    pub header_level_by_kind: HeaderLevels,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            signature_with_decorators: true,
            signature_with_return_type: true,
            signature_code_block: true,
            signature_with_def: true,
            classdef_code_block: true,
            data_code_block: false,
            insert_header_anchors: true,
            docstrings_as_blockquote: false,
            descriptive_class_title: true,
            add_method_class_prefix: true,
            add_member_class_prefix: false,
            render_module_header: true,
            render_toc: false,
            render_page_title: false,
            link_references: true,
            code_language: "python".to_string(),
            header_level_by_kind: HeaderLevels::default(),
        }
    }
}

impl RenderOptions {
    /// Parse from the `[renderer.options]` table; unknown keys are rejected
    pub fn from_table(table: &toml::Table) -> Result<Self> {
        let options: RenderOptions = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e| Error::configuration(format!("invalid renderer options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        self.header_level_by_kind.validate()?;
        if self.code_language.contains(char::is_whitespace) {
            return Err(Error::configuration("code_language must be a single word"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Signature, SourceLocation};

    fn table(s: &str) -> toml::Table {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = RenderOptions::from_table(&toml::Table::new()).unwrap();
        assert_eq!(options, RenderOptions::default());
        assert!(options.insert_header_anchors);
        assert!(!options.data_code_block);
        assert_eq!(options.header_level_by_kind.class, 2);
    }

    #[test]
    fn test_partial_override() {
        let options = RenderOptions::from_table(&table(
            "render_toc = true\ncode_language = \"py\"\n[header_level_by_kind]\nclass = 3\n",
        ))
        .unwrap();
        assert!(options.render_toc);
        assert_eq!(options.code_language, "py");
        assert_eq!(options.header_level_by_kind.class, 3);
        assert_eq!(options.header_level_by_kind.module, 1);
    }

    #[test]
    fn test_unknown_option() {
        let err = RenderOptions::from_table(&table("render_everything = true")).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("render_everything"));
    }

    #[test]
    fn test_header_level_range() {
        assert!(RenderOptions::from_table(&table("[header_level_by_kind]\nmethod = 7\n")).is_err());
        assert!(RenderOptions::from_table(&table("[header_level_by_kind]\nmodule = 0\n")).is_err());
        assert!(RenderOptions::from_table(&table("[header_level_by_kind]\nsubclass = 2\n")).is_err());
    }

    #[test]
    fn test_level_for_method() {
        let levels = HeaderLevels::default();
        let loc = SourceLocation::new("a.py", 1);
        let class = Symbol::new("A", Some("a"), SymbolKind::Class { bases: vec![] }, loc.clone());
        let module = Symbol::module("a", loc.clone());
        let func = Symbol::new(
            "f",
            Some("a.A"),
            SymbolKind::Function {
                signature: Signature::default(),
            },
            loc,
        );
        assert_eq!(levels.for_symbol(&func, Some(&class)), 4);
        assert_eq!(levels.for_symbol(&class, Some(&module)), 2);
        assert_eq!(levels.for_symbol(&module, None), 1);
    }
}
