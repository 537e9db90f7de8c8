// Python source inspection using tree-sitter
//
// This is the only place that looks at Python syntax. Everything downstream
// works on the Symbol model.

use crate::error::{Error, Result};
use crate::model::*;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Inspects Python files into module symbols
pub struct PythonInspector {
    parser: Parser,
}

/// Source text and file path shared by the extraction helpers
struct SourceContext<'a> {
    source: &'a [u8],
    file: &'a Path,
}

impl SourceContext<'_> {
    fn text(&self, node: &Node) -> Option<String> {
        node.utf8_text(self.source).ok().map(str::to_string)
    }

    fn location(&self, node: &Node) -> SourceLocation {
        SourceLocation::new(self.file, node.start_position().row + 1)
    }
}

impl PythonInspector {
    /// Create a new inspector
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Inspect a Python file as the module `qualified_name`
    pub fn inspect_file(&mut self, path: &Path, qualified_name: &str) -> Result<Symbol> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::load(path, e.to_string()))?;
        self.inspect_source(&source, path, qualified_name)
    }

    /// Inspect Python source text
    pub fn inspect_source(&mut self, source: &str, path: &Path, qualified_name: &str) -> Result<Symbol> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::load(path, "tree-sitter returned no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(Error::load(path, format!("syntax error at line {}", line)));
        }

        let ctx = SourceContext {
            source: source.as_bytes(),
            file: path,
        };

        let mut module = Symbol::module(qualified_name, SourceLocation::new(path, 1));
        module.docstring = block_docstring(&root, &ctx).map(Docstring::Raw);
        module.children = parse_members(&root, qualified_name, &ctx);
        Ok(module)
    }
}

/// Line of the first error or missing node
fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    Some(node.start_position().row + 1)
}

/// Statements of a module or block, without comments
fn statements<'tree>(node: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Docstring of a module, class or function body
fn block_docstring(block: &Node, ctx: &SourceContext) -> Option<String> {
    statements(block).first().and_then(|first| string_statement(first, ctx))
}

/// Content of a statement consisting of a single string literal
fn string_statement(node: &Node, ctx: &SourceContext) -> Option<String> {
    if node.kind() != "expression_statement" || node.named_child_count() != 1 {
        return None;
    }
    let inner = node.named_child(0)?;
    if inner.kind() != "string" {
        return None;
    }
    string_literal_content(&inner, ctx)
}

/// Strip prefix and quotes from a string literal, leaving the content untouched
fn string_literal_content(node: &Node, ctx: &SourceContext) -> Option<String> {
    let text = ctx.text(node)?;
    let prefix_len = text.find(|c| c == '"' || c == '\'')?;
    let prefix = text[..prefix_len].to_lowercase();
    // Byte and f-strings are not docstrings
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }

    let body = &text[prefix_len..];
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return Some(body[quote.len()..body.len() - quote.len()].to_string());
        }
    }
    None
}

/// Extract members of a module or class body in declaration order
fn parse_members(block: &Node, parent: &str, ctx: &SourceContext) -> Vec<Symbol> {
    let mut members: Vec<Symbol> = Vec::new();
    let stmts = statements(block);

    for (i, stmt) in stmts.iter().enumerate() {
        let member = match stmt.kind() {
            "class_definition" => parse_class(stmt, Vec::new(), parent, ctx),
            "function_definition" => parse_function(stmt, Vec::new(), parent, ctx),
            "decorated_definition" => parse_decorated(stmt, parent, ctx),
            "expression_statement" => parse_assignment(stmt, parent, ctx).map(|mut attr| {
                // A string right after an assignment documents it
                if let Some(doc) = stmts.get(i + 1).and_then(|next| string_statement(next, ctx)) {
                    attr.docstring = Some(Docstring::Raw(doc));
                }
                attr
            }),
            _ => None,
        };

        if let Some(member) = member {
            push_member(&mut members, member);
        }
    }

    members
}

/// Add a member, letting a redefinition replace the earlier one in place
pub(crate) fn push_member(members: &mut Vec<Symbol>, mut member: Symbol) {
    if member
        .decorators
        .iter()
        .any(|d| d.ends_with(".setter") || d.ends_with(".deleter"))
    {
        return;
    }

    if let Some(existing) = members.iter_mut().find(|m| m.name == member.name) {
        if member.docstring.is_none() {
            member.docstring = existing.docstring.take();
        }
        *existing = member;
    } else {
        members.push(member);
    }
}

fn parse_decorated(node: &Node, parent: &str, ctx: &SourceContext) -> Option<Symbol> {
    let decorators = extract_decorators(node, ctx);
    let definition = node.child_by_field_name("definition")?;
    match definition.kind() {
        "class_definition" => parse_class(&definition, decorators, parent, ctx),
        "function_definition" => parse_function(&definition, decorators, parent, ctx),
        _ => None,
    }
}

/// Extract decorator expressions from a decorated definition
fn extract_decorators(node: &Node, ctx: &SourceContext) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Some(text) = ctx.text(&child) {
                decorators.push(text.trim_start_matches('@').trim().to_string());
            }
        }
    }

    decorators
}

/// Parse a class definition
fn parse_class(node: &Node, decorators: Vec<String>, parent: &str, ctx: &SourceContext) -> Option<Symbol> {
    let name = ctx.text(&node.child_by_field_name("name")?)?;

    let mut bases = Vec::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            if base.kind() != "comment" {
                if let Some(text) = ctx.text(&base) {
                    bases.push(text);
                }
            }
        }
    }

    let mut class = Symbol::new(&name, Some(parent), SymbolKind::Class { bases }, ctx.location(node));
    class.decorators = decorators;

    if let Some(body) = node.child_by_field_name("body") {
        class.docstring = block_docstring(&body, ctx).map(Docstring::Raw);
        class.children = parse_members(&body, &class.qualified_name, ctx);
    }

    Some(class)
}

/// Parse a function or method definition
fn parse_function(node: &Node, decorators: Vec<String>, parent: &str, ctx: &SourceContext) -> Option<Symbol> {
    let name = ctx.text(&node.child_by_field_name("name")?)?;

    let mut cursor = node.walk();
    let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| parse_parameters(&p, ctx))
        .unwrap_or_default();
    let return_annotation = node.child_by_field_name("return_type").and_then(|t| ctx.text(&t));

    let signature = Signature {
        parameters,
        return_annotation,
        is_async,
    };

    let mut function = Symbol::new(&name, Some(parent), SymbolKind::Function { signature }, ctx.location(node));
    function.decorators = decorators;
    function.docstring = node
        .child_by_field_name("body")
        .and_then(|body| block_docstring(&body, ctx))
        .map(Docstring::Raw);

    Some(function)
}

/// Parse function parameters
fn parse_parameters(node: &Node, ctx: &SourceContext) -> Vec<Parameter> {
    let mut params: Vec<Parameter> = Vec::new();
    let mut keyword_only = false;
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        let param = match child.kind() {
            "identifier" => ctx.text(&child).map(|name| Parameter::new(&name)),
            "typed_parameter" => parse_typed_parameter(&child, ctx),
            "default_parameter" | "typed_default_parameter" => parse_default_parameter(&child, ctx),
            "list_splat_pattern" | "dictionary_splat_pattern" => parse_splat(&child, ctx),
            "keyword_separator" | "*" => {
                keyword_only = true;
                None
            }
            "positional_separator" | "/" => {
                for p in params.iter_mut() {
                    if p.kind == ParameterKind::Regular {
                        p.kind = ParameterKind::PositionalOnly;
                    }
                }
                None
            }
            _ => None,
        };

        if let Some(mut param) = param {
            match param.kind {
                ParameterKind::Args => keyword_only = true,
                ParameterKind::Regular if keyword_only => param.kind = ParameterKind::KeywordOnly,
                _ => {}
            }
            params.push(param);
        }
    }

    params
}

/// `*args` or `**kwargs`
fn parse_splat(node: &Node, ctx: &SourceContext) -> Option<Parameter> {
    let name = ctx.text(&node.named_child(0)?)?;
    let mut param = Parameter::new(&name);
    param.kind = if node.kind() == "list_splat_pattern" {
        ParameterKind::Args
    } else {
        ParameterKind::Kwargs
    };
    Some(param)
}

/// `name: type`, `*args: type` or `**kwargs: type`
fn parse_typed_parameter(node: &Node, ctx: &SourceContext) -> Option<Parameter> {
    let target = node.named_child(0)?;
    let mut param = match target.kind() {
        "identifier" => Parameter::new(&ctx.text(&target)?),
        "list_splat_pattern" | "dictionary_splat_pattern" => parse_splat(&target, ctx)?,
        _ => return None,
    };
    param.annotation = node.child_by_field_name("type").and_then(|t| ctx.text(&t));
    Some(param)
}

/// `name=value` or `name: type = value`
fn parse_default_parameter(node: &Node, ctx: &SourceContext) -> Option<Parameter> {
    let name = ctx.text(&node.child_by_field_name("name")?)?;
    let mut param = Parameter::new(&name);
    param.annotation = node.child_by_field_name("type").and_then(|t| ctx.text(&t));
    param.default = node.child_by_field_name("value").and_then(|v| ctx.text(&v));
    Some(param)
}

/// Parse `name = value`, `name: type` or `name: type = value`
fn parse_assignment(node: &Node, parent: &str, ctx: &SourceContext) -> Option<Symbol> {
    let assignment = node.named_child(0)?;
    if assignment.kind() != "assignment" {
        return None;
    }

    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = ctx.text(&left)?;

    let annotation = assignment.child_by_field_name("type").and_then(|t| ctx.text(&t));

    // `a = b = 1` nests the second assignment on the right
    let mut right = assignment.child_by_field_name("right");
    while let Some(r) = right {
        if r.kind() != "assignment" {
            break;
        }
        right = r.child_by_field_name("right");
    }
    let value = right.and_then(|r| ctx.text(&r));

    Some(Symbol::new(
        &name,
        Some(parent),
        SymbolKind::Attribute { annotation, value },
        ctx.location(&assignment),
    ))
}
