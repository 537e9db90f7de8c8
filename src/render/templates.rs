// Template engine for Markdown pages

use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

/// One rendered symbol on a page
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MemberView {
    pub anchor: Option<String>,
    pub heading: Option<String>,
    pub signature: Option<String>,
    pub body: String,
}

/// Everything the page template needs
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PageView {
    pub title: Option<String>,
    pub toc: Vec<String>,
    pub members: Vec<MemberView>,
    /// Shown when the page selected nothing
    pub placeholder: Option<String>,
    /// Render member bodies as block quotes
    pub blockquote: bool,
}

/// Template engine wrapping Tera with the embedded page template
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![("page.md", include_str!("../../templates/page.md.tera"))])?;

        tera.register_filter("blockquote", blockquote_filter);

        Ok(Self { tera })
    }

    /// Render a page, ending with exactly one newline
    pub fn render_page(&self, page: &PageView) -> Result<String> {
        let context = Context::from_serialize(page)?;
        let rendered = self.render("page.md", &context)?;
        Ok(format!("{}\n", rendered.trim_end()))
    }

    /// Render any registered template
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

fn blockquote_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value.as_str().unwrap_or("");
    Ok(Value::String(blockquote(s)))
}

/// Prefix every line with `> `
pub fn blockquote(s: &str) -> String {
    s.lines()
        .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert text to URL-friendly slug
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(heading: &str, body: &str) -> MemberView {
        MemberView {
            anchor: Some(format!("<a id=\"{}\"></a>", heading)),
            heading: Some(format!("## {}", heading)),
            signature: None,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API Documentation"), "api-documentation");
        assert_eq!(slugify("  spaced  out  "), "spaced-out");
        assert_eq!(slugify("!!"), "");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(blockquote("one\n\ntwo"), "> one\n>\n> two");
    }

    #[test]
    fn test_render_page_layout() {
        let engine = TemplateEngine::new().unwrap();
        let page = PageView {
            members: vec![member("a", "Body A."), member("b", "")],
            ..Default::default()
        };
        assert_eq!(
            engine.render_page(&page).unwrap(),
            "<a id=\"a\"></a>\n\n## a\n\nBody A.\n\n<a id=\"b\"></a>\n\n## b\n"
        );
    }

    #[test]
    fn test_render_title_and_toc() {
        let engine = TemplateEngine::new().unwrap();
        let page = PageView {
            title: Some("Summary".to_string()),
            toc: vec!["* [a](#a)".to_string(), "  * [b](#b)".to_string()],
            members: vec![MemberView {
                heading: Some("## a".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            engine.render_page(&page).unwrap(),
            "# Summary\n\n* [a](#a)\n  * [b](#b)\n\n## a\n"
        );
    }

    #[test]
    fn test_render_placeholder() {
        let engine = TemplateEngine::new().unwrap();
        let page = PageView {
            placeholder: Some("_Nothing here._".to_string()),
            ..Default::default()
        };
        assert_eq!(engine.render_page(&page).unwrap(), "_Nothing here._\n");
    }

    #[test]
    fn test_render_blockquote() {
        let engine = TemplateEngine::new().unwrap();
        let page = PageView {
            members: vec![MemberView {
                body: "Quoted <b>text</b>.".to_string(),
                ..Default::default()
            }],
            blockquote: true,
            ..Default::default()
        };
        assert_eq!(engine.render_page(&page).unwrap(), "> Quoted <b>text</b>.\n");
    }
}
