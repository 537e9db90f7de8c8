// Declarative page tree and symbol selectors

use crate::error::{Error, Result};
use crate::model::{Symbol, SymbolTree};
use crate::render::templates::slugify;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A page as written in the configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    pub title: String,
    /// Slug for the output file or directory; derived from the title if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Static document, relative to the configuration file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Selector patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PageSpec>>,
}

impl PageSpec {
    /// A selector page
    pub fn selector(title: &str, contents: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            name: None,
            source: None,
            contents: Some(contents.iter().map(|c| c.to_string()).collect()),
            children: None,
        }
    }
}

/// A dot-separated pattern over qualified names
///
/// Each segment is a glob that never crosses a dot. A trailing `*` in the
/// last segment also matches descendants, and a final `.*` segment also
/// matches the prefix itself: `asset_types.*` selects `asset_types`,
/// `asset_types.Foo` and `asset_types.Foo.bar`.
#[derive(Debug, Clone)]
pub struct Selector {
    pattern: String,
    segments: Vec<Pattern>,
    descendants: bool,
    includes_prefix: bool,
}

impl Selector {
    pub fn parse(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        let parts: Vec<&str> = pattern.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(Error::configuration(format!(
                "invalid selector '{}': empty segment",
                pattern
            )));
        }

        let segments = parts
            .iter()
            .map(|part| {
                Pattern::new(part)
                    .map_err(|e| Error::configuration(format!("invalid selector '{}': {}", pattern, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let last = parts.last().copied().unwrap_or_default();
        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            descendants: last.ends_with('*'),
            includes_prefix: parts.len() > 1 && last == "*",
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check a qualified name against the pattern
    pub fn matches(&self, qualified_name: &str) -> bool {
        let parts: Vec<&str> = qualified_name.split('.').collect();
        let n = self.segments.len();

        let prefix_matches = |count: usize| {
            self.segments
                .iter()
                .zip(&parts)
                .take(count)
                .all(|(segment, part)| segment.matches(part))
        };

        if parts.len() == n || (parts.len() > n && self.descendants) {
            prefix_matches(n)
        } else if self.includes_prefix && parts.len() == n - 1 {
            prefix_matches(n - 1)
        } else {
            false
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// Symbols matched by any selector, in declaration order, each once
pub fn select<'a>(selectors: &[Selector], tree: &'a SymbolTree) -> Vec<(&'a Symbol, Option<&'a Symbol>)> {
    tree.walk_with_parent()
        .into_iter()
        .filter(|(symbol, _)| selectors.iter().any(|s| s.matches(&symbol.qualified_name)))
        .collect()
}

/// What a validated page holds
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Static document copied verbatim
    Document(PathBuf),
    Selector(Vec<Selector>),
    Branch(Vec<PageNode>),
}

/// A validated page
#[derive(Debug, Clone)]
pub struct PageNode {
    pub title: String,
    pub name: String,
    pub content: PageContent,
}

impl PageNode {
    pub fn is_leaf(&self) -> bool {
        !matches!(self.content, PageContent::Branch(_))
    }

    fn from_spec(spec: &PageSpec, base_dir: &Path) -> Result<Self> {
        let name = match &spec.name {
            Some(name) => name.clone(),
            None => slugify(&spec.title),
        };
        if !is_valid_slug(&name) {
            return Err(Error::configuration(format!(
                "page '{}' has an invalid name '{}'",
                spec.title, name
            )));
        }

        let content = match (&spec.source, &spec.contents, &spec.children) {
            (Some(source), None, None) => PageContent::Document(base_dir.join(source)),
            (None, Some(contents), None) => {
                if contents.is_empty() {
                    return Err(Error::configuration(format!("page '{}' has empty contents", spec.title)));
                }
                PageContent::Selector(contents.iter().map(|c| Selector::parse(c)).collect::<Result<_>>()?)
            }
            (None, None, Some(children)) => {
                if children.is_empty() {
                    return Err(Error::configuration(format!("page '{}' has no children", spec.title)));
                }
                PageContent::Branch(build_siblings(children, base_dir)?)
            }
            _ => {
                return Err(Error::configuration(format!(
                    "page '{}' must set exactly one of source, contents or children",
                    spec.title
                )))
            }
        };

        Ok(Self {
            title: spec.title.clone(),
            name,
            content,
        })
    }
}

fn is_valid_slug(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
}

fn build_siblings(specs: &[PageSpec], base_dir: &Path) -> Result<Vec<PageNode>> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(specs.len());

    for spec in specs {
        let node = PageNode::from_spec(spec, base_dir)?;
        // Compared case-insensitively so output is portable
        if !seen.insert(node.name.to_lowercase()) {
            return Err(Error::configuration(format!(
                "duplicate page name '{}' among siblings",
                node.name
            )));
        }
        nodes.push(node);
    }

    Ok(nodes)
}

/// A leaf page with its output path
#[derive(Debug, Clone)]
pub struct PageLeaf<'a> {
    pub node: &'a PageNode,
    /// Path relative to the output directory
    pub path: PathBuf,
    /// Titles from the root page down to this one
    pub titles: Vec<String>,
}

/// The validated page tree
#[derive(Debug, Clone)]
pub struct PageTree {
    pub roots: Vec<PageNode>,
}

impl PageTree {
    /// Validate page specs; static sources resolve against `base_dir`
    pub fn from_specs(specs: &[PageSpec], base_dir: &Path) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::configuration("page tree is empty"));
        }
        Ok(Self {
            roots: build_siblings(specs, base_dir)?,
        })
    }

    /// Single page listing everything
    pub fn default_specs() -> Vec<PageSpec> {
        vec![PageSpec::selector("API", &["*"])]
    }

    /// Leaf pages in depth-first order
    pub fn leaves(&self) -> Vec<PageLeaf<'_>> {
        fn visit<'a>(nodes: &'a [PageNode], dir: &Path, titles: &[String], out: &mut Vec<PageLeaf<'a>>) {
            for node in nodes {
                let mut trail = titles.to_vec();
                trail.push(node.title.clone());
                match &node.content {
                    PageContent::Branch(children) => visit(children, &dir.join(&node.name), &trail, out),
                    _ => out.push(PageLeaf {
                        node,
                        path: dir.join(format!("{}.md", node.name)),
                        titles: trail,
                    }),
                }
            }
        }

        let mut out = Vec::new();
        visit(&self.roots, Path::new(""), &[], &mut out);
        out
    }

    /// Directories for branch pages, parents first
    pub fn directories(&self) -> Vec<PathBuf> {
        fn visit(nodes: &[PageNode], dir: &Path, out: &mut Vec<PathBuf>) {
            for node in nodes {
                if let PageContent::Branch(children) = &node.content {
                    let path = dir.join(&node.name);
                    out.push(path.clone());
                    visit(children, &path, out);
                }
            }
        }

        let mut out = Vec::new();
        visit(&self.roots, Path::new(""), &mut out);
        out
    }
}
