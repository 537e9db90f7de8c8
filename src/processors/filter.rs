// Member filtering

use super::{parse_options, Processor};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::model::{Symbol, SymbolTree};
use crate::pages::Selector;
use serde::Deserialize;

pub const NAME: &str = "filter";

/// Exclusion policy
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterOptions {
    /// Drop members whose name starts with a single underscore
    pub exclude_private: bool,
    /// Drop `__dunder__` members
    pub exclude_special: bool,
    /// Drop members without a docstring
    pub documented_only: bool,
    /// Patterns that override the exclusions, matched against the short
    /// or the qualified name
    pub include: Vec<String>,
    /// Never drop modules
    pub do_not_filter_modules: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            exclude_private: true,
            exclude_special: true,
            documented_only: false,
            include: Vec::new(),
            do_not_filter_modules: true,
        }
    }
}

/// Removes symbols matching the exclusion policy
#[derive(Debug)]
pub struct FilterProcessor {
    options: FilterOptions,
    include: Vec<Selector>,
}

impl FilterProcessor {
    pub fn new(options: FilterOptions) -> Result<Self> {
        let include = options
            .include
            .iter()
            .map(|p| Selector::parse(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { options, include })
    }

    pub fn from_options(options: &toml::Table) -> Result<Self> {
        Self::new(parse_options(NAME, options)?)
    }

    fn is_included(&self, symbol: &Symbol) -> bool {
        self.include
            .iter()
            .any(|s| s.matches(&symbol.name) || s.matches(&symbol.qualified_name))
    }

    /// Decide on a single symbol, ignoring its children
    fn keep(&self, symbol: &Symbol) -> bool {
        if symbol.kind.is_module() && self.options.do_not_filter_modules {
            return true;
        }
        if self.is_included(symbol) {
            return true;
        }
        if self.options.exclude_private && symbol.is_private() {
            return false;
        }
        if self.options.exclude_special && symbol.is_special() {
            return false;
        }
        if self.options.documented_only && !symbol.has_docstring() {
            return false;
        }
        true
    }

    /// Filter children first, then decide on each child
    fn filter_members(&self, members: Vec<Symbol>) -> Vec<Symbol> {
        members
            .into_iter()
            .filter_map(|mut member| {
                member.children = self.filter_members(std::mem::take(&mut member.children));
                self.keep(&member).then_some(member)
            })
            .collect()
    }
}

fn member_count(tree: &SymbolTree) -> usize {
    tree.walk().iter().filter(|s| !s.kind.is_module()).count()
}

impl Processor for FilterProcessor {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&self, tree: &mut SymbolTree, diagnostics: &mut Diagnostics) -> Result<()> {
        let before = member_count(tree);
        tree.modules = self.filter_members(std::mem::take(&mut tree.modules));

        if before > 0 && member_count(tree) == 0 {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::EmptyFilterResult,
                format!("all {} members were filtered out", before),
            ));
        }
        Ok(())
    }
}
