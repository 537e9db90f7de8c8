// Page tree rendering to a directory of Markdown files

pub mod markdown;
pub mod options;
pub mod templates;

pub use markdown::{LinkContext, MarkdownFormatter};
pub use options::{HeaderLevels, RenderOptions};
pub use templates::{MemberView, PageView, TemplateEngine};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::model::{Symbol, SymbolTree};
use crate::pages::{select, PageContent, PageTree};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const EMPTY_PLACEHOLDER: &str = "_No documented symbols match this page._";

/// What a planned page will hold
#[derive(Debug)]
pub enum PlannedContent<'a> {
    Document(&'a Path),
    Symbols(Vec<(&'a Symbol, Option<&'a Symbol>)>),
}

/// A leaf page, fully resolved but not yet written
#[derive(Debug)]
pub struct PlannedPage<'a> {
    /// Path relative to the output directory
    pub path: PathBuf,
    pub title: String,
    pub titles: Vec<String>,
    pub content: PlannedContent<'a>,
}

impl PlannedPage<'_> {
    pub fn symbol_count(&self) -> usize {
        match &self.content {
            PlannedContent::Symbols(symbols) => symbols.len(),
            PlannedContent::Document(_) => 0,
        }
    }
}

/// Result of the dry run: everything needed to write, nothing written
#[derive(Debug)]
pub struct RenderPlan<'a> {
    pub directories: Vec<PathBuf>,
    pub pages: Vec<PlannedPage<'a>>,
    /// First page rendering each qualified name
    pub links: HashMap<String, PathBuf>,
}

/// One written page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedPage {
    pub path: PathBuf,
    pub titles: Vec<String>,
    /// SHA-256 of the written bytes, hex encoded
    pub digest: String,
    pub bytes: usize,
    pub symbols: usize,
}

/// Outcome of a render
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub output_dir: PathBuf,
    pub pages: Vec<RenderedPage>,
}

impl RenderReport {
    pub fn summary(&self) -> String {
        let symbols: usize = self.pages.iter().map(|p| p.symbols).sum();
        let bytes: usize = self.pages.iter().map(|p| p.bytes).sum();
        format!(
            "Rendered {} pages ({} symbols, {} bytes) to {}",
            self.pages.len(),
            symbols,
            bytes,
            self.output_dir.display()
        )
    }
}

/// Renders a page tree over a processed symbol tree
pub struct Renderer {
    options: RenderOptions,
    engine: TemplateEngine,
    output_dir: PathBuf,
    require_nonempty: bool,
    verbose: bool,
}

impl Renderer {
    pub fn new(options: RenderOptions, output_dir: impl Into<PathBuf>) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            engine: TemplateEngine::new()?,
            output_dir: output_dir.into(),
            require_nonempty: false,
            verbose: false,
        })
    }

    /// Fail on selectors that match nothing instead of warning
    pub fn with_require_nonempty(mut self, require_nonempty: bool) -> Self {
        self.require_nonempty = require_nonempty;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resolve every page without touching the output directory
    pub fn plan<'a>(
        &self,
        pages: &'a PageTree,
        tree: &'a SymbolTree,
        diagnostics: &mut Diagnostics,
    ) -> Result<RenderPlan<'a>> {
        let directories = pages.directories();
        let mut taken: HashSet<String> = directories.iter().map(|d| path_key(d)).collect();
        let mut planned = Vec::new();
        let mut links: HashMap<String, PathBuf> = HashMap::new();

        for leaf in pages.leaves() {
            if !taken.insert(path_key(&leaf.path)) {
                return Err(Error::configuration(format!(
                    "output path '{}' is produced twice",
                    leaf.path.display()
                )));
            }

            let content = match &leaf.node.content {
                PageContent::Document(source) => {
                    if !source.is_file() {
                        return Err(Error::configuration(format!(
                            "page '{}' references missing document '{}'",
                            leaf.node.title,
                            source.display()
                        )));
                    }
                    PlannedContent::Document(source.as_path())
                }
                PageContent::Selector(selectors) => {
                    let matched = select(selectors, tree);
                    if matched.is_empty() {
                        let patterns: Vec<String> = selectors.iter().map(|s| s.to_string()).collect();
                        let message = format!(
                            "page '{}' matches no symbols ({})",
                            leaf.node.title,
                            patterns.join(", ")
                        );
                        if self.require_nonempty {
                            return Err(Error::render(message));
                        }
                        diagnostics.push(Diagnostic::new(DiagnosticKind::EmptySelector, message));
                    }
                    for (symbol, _) in &matched {
                        links
                            .entry(symbol.qualified_name.clone())
                            .or_insert_with(|| leaf.path.clone());
                    }
                    PlannedContent::Symbols(matched)
                }
                PageContent::Branch(_) => continue,
            };

            planned.push(PlannedPage {
                path: leaf.path,
                title: leaf.node.title.clone(),
                titles: leaf.titles,
                content,
            });
        }

        Ok(RenderPlan {
            directories,
            pages: planned,
            links,
        })
    }

    /// Plan, then write every leaf page in parallel
    pub fn render(&self, pages: &PageTree, tree: &SymbolTree, diagnostics: &mut Diagnostics) -> Result<RenderReport> {
        let plan = self.plan(pages, tree, diagnostics)?;

        fs::create_dir_all(&self.output_dir)?;
        for dir in &plan.directories {
            fs::create_dir_all(self.output_dir.join(dir))?;
        }

        let progress = if self.verbose {
            let pb = ProgressBar::new(plan.pages.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
                pb.set_style(style);
            }
            Some(pb)
        } else {
            None
        };

        let rendered = plan
            .pages
            .par_iter()
            .map(|page| {
                let result = self.write_page(page, &plan.links);
                if let Some(pb) = &progress {
                    pb.set_message(page.path.display().to_string());
                    pb.inc(1);
                }
                result
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(RenderReport {
            output_dir: self.output_dir.clone(),
            pages: rendered,
        })
    }

    /// Page content as it will be written
    pub fn page_bytes(&self, page: &PlannedPage, links: &HashMap<String, PathBuf>) -> Result<Vec<u8>> {
        match &page.content {
            PlannedContent::Document(source) => Ok(fs::read(source)?),
            PlannedContent::Symbols(symbols) => {
                let view = self.page_view(page, symbols, links);
                Ok(self.engine.render_page(&view)?.into_bytes())
            }
        }
    }

    fn page_view(
        &self,
        page: &PlannedPage,
        symbols: &[(&Symbol, Option<&Symbol>)],
        links: &HashMap<String, PathBuf>,
    ) -> PageView {
        let formatter = MarkdownFormatter::new(&self.options);
        let context = LinkContext {
            page: &page.path,
            links,
            anchors: self.options.insert_header_anchors,
        };

        let toc = if self.options.render_toc {
            let base = symbols
                .iter()
                .map(|(s, p)| formatter.level(s, *p))
                .min()
                .unwrap_or(1);
            symbols.iter().map(|(s, p)| formatter.toc_entry(s, *p, base)).collect()
        } else {
            Vec::new()
        };

        PageView {
            title: self.options.render_page_title.then(|| page.title.clone()),
            toc,
            members: symbols
                .iter()
                .map(|(s, p)| formatter.member(s, *p, &context))
                .collect(),
            placeholder: symbols.is_empty().then(|| EMPTY_PLACEHOLDER.to_string()),
            blockquote: self.options.docstrings_as_blockquote,
        }
    }

    fn write_page(&self, page: &PlannedPage, links: &HashMap<String, PathBuf>) -> Result<RenderedPage> {
        let bytes = self.page_bytes(page, links)?;

        {
            let file = File::create(self.output_dir.join(&page.path))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&bytes)?;
            writer.flush()?;
        }

        Ok(RenderedPage {
            path: page.path.clone(),
            titles: page.titles.clone(),
            digest: digest(&bytes),
            bytes: bytes.len(),
            symbols: page.symbol_count(),
        })
    }
}

/// Hex encoded SHA-256
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Case-insensitive key so output stays portable
fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
