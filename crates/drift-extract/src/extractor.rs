//! Python definition extraction over tree-sitter syntax trees

use drift_core::error::{CoreError, Result};
use drift_core::model::{Definition, DefinitionKind};
use tree_sitter::Node;

use crate::parser_pool::ParserPool;

/// Extracts function, async-function, and class definitions from Python
/// source text.
pub struct PythonExtractor {
    parser_pool: ParserPool,
}

impl PythonExtractor {
    pub fn new(parser_pool: ParserPool) -> Self {
        Self { parser_pool }
    }

    /// Extract every definition from `source` in document order, at any
    /// nesting depth.
    ///
    /// Bodies are re-sliced from the original text by line span, so
    /// formatting and comments are preserved exactly. Empty or
    /// whitespace-only input yields an empty list; syntactically invalid
    /// input yields a `ParseError` with the position of the first offense.
    pub fn extract(&self, source: &str) -> Result<Vec<Definition>> {
        if source.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tree = self
            .parser_pool
            .parse_blocking(source)
            .map_err(|e| CoreError::Parse {
                line: 0,
                column: 0,
                message: format!("parser unavailable: {e}"),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column, message) = first_syntax_error(root);
            return Err(CoreError::Parse {
                line,
                column,
                message,
            });
        }

        let lines: Vec<&str> = source.split('\n').collect();
        let mut definitions = Vec::new();
        collect_definitions(root, source, &lines, &mut definitions);
        Ok(definitions)
    }
}

/// Position and description of the first ERROR or MISSING node in document
/// order.
fn first_syntax_error(root: Node) -> (usize, usize, String) {
    fn walk(node: Node, found: &mut Option<(usize, usize, String)>) {
        if found.is_some() {
            return;
        }
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "invalid syntax".to_string()
            };
            *found = Some((pos.row, pos.column, message));
            return;
        }
        if !node.has_error() {
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            walk(child, found);
        }
    }

    let mut found = None;
    walk(root, &mut found);
    found.unwrap_or((0, 0, "invalid syntax".to_string()))
}

fn collect_definitions(node: Node, source: &str, lines: &[&str], out: &mut Vec<Definition>) {
    if node.kind() == "function_definition" || node.kind() == "class_definition" {
        if let Some(definition) = build_definition(node, source, lines) {
            out.push(definition);
        }
    }

    // Nested definitions are collected independently, so recursion
    // continues into definition bodies too.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_definitions(child, source, lines, out);
    }
}

fn build_definition(node: Node, source: &str, lines: &[&str]) -> Option<Definition> {
    let name_node = node.child_by_field_name("name")?;
    let name = name_node.utf8_text(source.as_bytes()).ok()?.to_string();

    let kind = if node.kind() == "class_definition" {
        DefinitionKind::Class
    } else if is_async(node) {
        DefinitionKind::AsyncFunction
    } else {
        DefinitionKind::Function
    };

    let start_line = node.start_position().row;
    let mut end_line = node.end_position().row;
    // A node ending exactly at a line break reports the break's row.
    if node.end_position().column == 0 && end_line > start_line {
        end_line -= 1;
    }
    let end_line = end_line.min(lines.len().saturating_sub(1));
    if end_line < start_line {
        return None;
    }

    Some(Definition {
        name,
        kind,
        start_line,
        end_line,
        body_text: lines[start_line..=end_line].join("\n"),
        decorators: decorators_of(node, source),
        docstring: docstring_of(node, source),
    })
}

fn is_async(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "async")
}

/// Decorator expressions attached via a wrapping `decorated_definition`
/// node, in source order, `@` stripped.
fn decorators_of(node: Node, source: &str) -> Vec<String> {
    let Some(parent) = node.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }

    let mut decorators = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Ok(text) = child.utf8_text(source.as_bytes()) {
                decorators.push(text.trim_start_matches('@').trim().to_string());
            }
        }
    }
    decorators
}

/// Cooked text of a leading string expression statement in the body, when
/// present.
fn docstring_of(node: Node, source: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }

    let mut content = String::new();
    let mut cursor = expr.walk();
    for child in expr.children(&mut cursor) {
        if child.kind() == "string_content" {
            if let Ok(text) = child.utf8_text(source.as_bytes()) {
                content.push_str(text);
            }
        }
    }
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}
