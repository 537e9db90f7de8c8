// Markdown formatting of individual symbols

use super::options::RenderOptions;
use super::templates::{slugify, MemberView};
use crate::model::*;
use crate::processors::crossref::backtick_spans;
use crate::processors::docstring::cleandoc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where symbols live, from the point of view of one page
pub struct LinkContext<'a> {
    /// Path of the page being rendered, relative to the output directory
    pub page: &'a Path,
    /// First page rendering each qualified name
    pub links: &'a HashMap<String, PathBuf>,
    pub anchors: bool,
}

impl LinkContext<'_> {
    /// Link target for a qualified name, if it is rendered anywhere
    pub fn href(&self, target: &str) -> Option<String> {
        let page = self.links.get(target)?;
        let base = if page == self.page {
            String::new()
        } else {
            relative_link(self.page, page)
        };
        let fragment = if self.anchors {
            format!("#{}", target)
        } else {
            String::new()
        };
        let href = format!("{}{}", base, fragment);
        (!href.is_empty()).then_some(href)
    }
}

/// Relative path from one page to another, `/`-separated
pub fn relative_link(from: &Path, to: &Path) -> String {
    let parts = |p: &Path| -> Vec<String> {
        p.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    };
    let from_dir = from.parent().map(parts).unwrap_or_default();
    let to_parts = parts(to);

    let common = from_dir
        .iter()
        .zip(&to_parts[..to_parts.len().saturating_sub(1)])
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<String> = vec!["..".to_string(); from_dir.len() - common];
    out.extend(to_parts[common..].iter().cloned());
    out.join("/")
}

/// Turn resolved references in a text field into Markdown links
pub fn link_text(text: &str, references: &[&CrossReference], links: &LinkContext) -> String {
    let spans = backtick_spans(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for reference in references {
        let Some(href) = reference.target().and_then(|t| links.href(t)) else {
            continue;
        };
        if reference.start < cursor || reference.end > text.len() {
            continue;
        }

        let span = spans
            .iter()
            .find(|&&(open, close)| reference.start > open && reference.end <= close);
        let (start, end, label) = match span {
            // Only a span holding exactly the token can become a link
            Some(&(open, close)) if open + 1 == reference.start && close == reference.end => {
                (open, close + 1, format!("`{}`", reference.token))
            }
            Some(_) => continue,
            None => (reference.start, reference.end, reference.token.clone()),
        };
        if start < cursor {
            continue;
        }

        out.push_str(&text[cursor..start]);
        out.push_str(&format!("[{}]({})", label, href));
        cursor = end;
    }

    out.push_str(&text[cursor..]);
    out
}

/// Escape characters that Markdown would read as emphasis
pub fn escape_markdown(s: &str) -> String {
    s.replace('_', "\\_").replace('*', "\\*")
}

/// Indent continuation lines so they stay inside a list item
fn indent_continuation(s: &str) -> String {
    s.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats symbols according to the rendering options
pub struct MarkdownFormatter<'a> {
    options: &'a RenderOptions,
}

impl<'a> MarkdownFormatter<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    pub fn level(&self, symbol: &Symbol, parent: Option<&Symbol>) -> usize {
        self.options.header_level_by_kind.for_symbol(symbol, parent)
    }

    /// Heading text without the leading hashes
    pub fn heading_title(&self, symbol: &Symbol, parent: Option<&Symbol>) -> String {
        let parent_class = parent.filter(|p| p.kind.is_class());
        let title = match &symbol.kind {
            SymbolKind::Module => symbol.qualified_name.clone(),
            SymbolKind::Class { .. } if self.options.descriptive_class_title => format!("{} Objects", symbol.name),
            SymbolKind::Class { .. } => symbol.name.clone(),
            SymbolKind::Function { .. } => match parent_class {
                Some(class) if self.options.add_method_class_prefix => format!("{}.{}", class.name, symbol.name),
                _ => symbol.name.clone(),
            },
            SymbolKind::Attribute { .. } => match parent_class {
                Some(class) if self.options.add_member_class_prefix => format!("{}.{}", class.name, symbol.name),
                _ => symbol.name.clone(),
            },
        };
        escape_markdown(&title)
    }

    /// Table of contents line, indented relative to `base_level`
    pub fn toc_entry(&self, symbol: &Symbol, parent: Option<&Symbol>, base_level: usize) -> String {
        let level = self.level(symbol, parent);
        let title = self.heading_title(symbol, parent);
        let anchor = if self.options.insert_header_anchors {
            symbol.qualified_name.clone()
        } else {
            slugify(&title)
        };
        format!(
            "{}* [{}](#{})",
            "  ".repeat(level.saturating_sub(base_level)),
            title,
            anchor
        )
    }

    /// Everything shown for one symbol
    pub fn member(&self, symbol: &Symbol, parent: Option<&Symbol>, links: &LinkContext) -> MemberView {
        let show_heading = !symbol.kind.is_module() || self.options.render_module_header;
        let level = self.level(symbol, parent);

        MemberView {
            anchor: self
                .options
                .insert_header_anchors
                .then(|| format!("<a id=\"{}\"></a>", symbol.qualified_name)),
            heading: show_heading.then(|| format!("{} {}", "#".repeat(level), self.heading_title(symbol, parent))),
            signature: self.signature(symbol),
            body: self.body(symbol, links),
        }
    }

    fn decorator_lines(&self, symbol: &Symbol) -> Vec<String> {
        if !self.options.signature_with_decorators {
            return Vec::new();
        }
        symbol.decorators.iter().map(|d| format!("@{}", d)).collect()
    }

    fn code_block(&self, lines: &[String]) -> String {
        format!("```{}\n{}\n```", self.options.code_language, lines.join("\n"))
    }

    /// Signature block for classes, functions and (optionally) attributes
    pub fn signature(&self, symbol: &Symbol) -> Option<String> {
        match &symbol.kind {
            SymbolKind::Module => None,
            SymbolKind::Class { bases } => {
                if !self.options.classdef_code_block {
                    return None;
                }
                let mut lines = self.decorator_lines(symbol);
                if bases.is_empty() {
                    lines.push(format!("class {}", symbol.name));
                } else {
                    lines.push(format!("class {}({})", symbol.name, bases.join(", ")));
                }
                Some(self.code_block(&lines))
            }
            SymbolKind::Function { signature } => {
                let mut lines = self.decorator_lines(symbol);
                let prefix = match (self.options.signature_with_def, signature.is_async) {
                    (true, true) => "async def ",
                    (true, false) => "def ",
                    (false, _) => "",
                };
                lines.push(format!(
                    "{}{}",
                    prefix,
                    signature.format(&symbol.name, self.options.signature_with_return_type)
                ));

                if self.options.signature_code_block {
                    Some(self.code_block(&lines))
                } else {
                    Some(lines.iter().map(|l| format!("`{}`", l)).collect::<Vec<_>>().join("\n\n"))
                }
            }
            SymbolKind::Attribute { annotation, value } => {
                if !self.options.data_code_block {
                    return None;
                }
                let mut line = symbol.name.clone();
                if let Some(annotation) = annotation {
                    line.push_str(&format!(": {}", annotation));
                }
                if let Some(value) = value {
                    line.push_str(&format!(" = {}", value));
                }
                Some(self.code_block(&[line]))
            }
        }
    }

    /// Docstring rendered as Markdown
    pub fn body(&self, symbol: &Symbol, links: &LinkContext) -> String {
        let link = |text: &str, field: TextField| -> String {
            if !self.options.link_references {
                return text.to_string();
            }
            let refs: Vec<&CrossReference> = symbol.references.iter().filter(|r| r.field == field).collect();
            link_text(text, &refs, links)
        };

        match &symbol.docstring {
            None => String::new(),
            Some(Docstring::Raw(raw)) => cleandoc(&link(raw, TextField::Summary)),
            Some(Docstring::Structured(doc)) => {
                let mut blocks = Vec::new();
                if !doc.summary.is_empty() {
                    blocks.push(link(&doc.summary, TextField::Summary));
                }

                for (s, section) in doc.sections.iter().enumerate() {
                    let title = match section.kind {
                        SectionKind::Other => section.title.as_str(),
                        kind => kind.display_title(),
                    };

                    let content = match &section.body {
                        SectionBody::Entries(entries) => entries
                            .iter()
                            .enumerate()
                            .map(|(e, entry)| {
                                let mut parts = vec!["-".to_string()];
                                if let Some(name) = &entry.name {
                                    parts.push(format!("`{}`", name));
                                }
                                if let Some(ty) = &entry.type_name {
                                    parts.push(format!("_{}_", link(ty, TextField::EntryType { section: s, entry: e })));
                                }
                                let description = link(
                                    &entry.description,
                                    TextField::EntryDescription { section: s, entry: e },
                                );
                                if !description.is_empty() {
                                    if parts.len() > 1 {
                                        parts.push("-".to_string());
                                    }
                                    parts.push(indent_continuation(&description));
                                }
                                parts.join(" ")
                            })
                            .collect::<Vec<_>>()
                            .join("\n"),
                        SectionBody::Text(text) if section.kind == SectionKind::Examples => {
                            self.code_block(&[text.clone()])
                        }
                        SectionBody::Text(text) => link(text, TextField::SectionText { section: s }),
                    };

                    blocks.push(format!("**{}**:\n\n{}", title, content));
                }

                blocks.join("\n\n")
            }
        }
    }
}
