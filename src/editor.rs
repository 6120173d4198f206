use tracing::debug;

use crate::error::GradleditError;
use crate::groovy::{InvocationTree, NodeId, parse};
use crate::span::{Position, Span, offset, span_offsets};

pub const DEFAULT_INDENT_WIDTH: usize = 4;

pub fn insert_at(
    text: &str,
    fragment: &str,
    line: usize,
    column: usize,
) -> Result<String, GradleditError> {
    let at = offset(text, line, column)?;
    let mut updated = String::with_capacity(text.len() + fragment.len());
    updated.push_str(&text[..at]);
    updated.push_str(fragment);
    updated.push_str(&text[at..]);
    Ok(updated)
}

pub fn remove_span(text: &str, span: &Span) -> Result<String, GradleditError> {
    replace_span(text, span, "")
}

pub fn replace_span(text: &str, span: &Span, replacement: &str) -> Result<String, GradleditError> {
    let (start, end) = span_offsets(text, span)?;
    let mut updated = text.to_string();
    updated.replace_range(start..end, replacement);
    Ok(updated)
}

/// Removes `span`; when it was the only content of its lines, removes those
/// lines too together with the blank lines directly around them.
pub fn remove_span_with_line(text: &str, span: &Span) -> Result<String, GradleditError> {
    let (start, end) = span_offsets(text, span)?;
    let line_start = line_start_of(text, start);
    let line_end = text[end..].find('\n').map_or(text.len(), |index| end + index);

    let alone_on_line =
        text[line_start..start].trim().is_empty() && text[end..line_end].trim().is_empty();
    if !alone_on_line {
        let mut updated = text.to_string();
        updated.replace_range(start..end, "");
        return Ok(updated);
    }

    let mut remove_start = line_start;
    let mut remove_end = if line_end < text.len() {
        line_end + 1
    } else {
        text.len()
    };

    while let Some(next_break) = text[remove_end..].find('\n') {
        if !text[remove_end..remove_end + next_break].trim().is_empty() {
            break;
        }
        remove_end += next_break + 1;
    }

    while remove_start > 0 {
        let previous_start = line_start_of(text, remove_start - 1);
        if !text[previous_start..remove_start - 1].trim().is_empty() {
            break;
        }
        remove_start = previous_start;
    }

    // An unterminated last line takes the newline before it instead.
    if remove_end == text.len() && !text.ends_with('\n') && remove_start > 0 {
        remove_start -= 1;
    }

    let mut updated = String::with_capacity(text.len());
    updated.push_str(&text[..remove_start]);
    updated.push_str(&text[remove_end..]);
    Ok(updated)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditor {
    indent_unit: String,
}

impl Default for TextEditor {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT_WIDTH)
    }
}

impl TextEditor {
    pub fn new(indent_width: usize) -> Self {
        Self {
            indent_unit: " ".repeat(indent_width),
        }
    }

    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    /// Appends `fragment` as the last statement of the closure `id`, indented
    /// like the statements already in its body.
    pub fn append_into_closure(
        &self,
        text: &str,
        tree: &InvocationTree,
        id: NodeId,
        fragment: &str,
    ) -> Result<String, GradleditError> {
        let body = tree
            .closure_body(id)
            .ok_or_else(|| GradleditError::InvalidRequest {
                message: format!("Invocation '{}' does not take a closure", tree.node(id).name),
            })?;
        let Some(braces) = body.braces else {
            return Ok(append_at_end(text, fragment));
        };

        let owner_indent = leading_whitespace_at(text, tree.node(id).span.start)?;
        let body_indent = match first_statement_start(tree, id) {
            Some(first) if first.line > braces.open.line => leading_whitespace_at(text, first)?,
            _ => format!("{owner_indent}{}", self.indent_unit),
        };
        let indented = indent_lines(fragment, &body_indent);

        let Some(close) = braces.close else {
            return Ok(append_at_end(text, &indented));
        };

        let close_offset = offset(text, close.line, close.column)?;
        let close_line_start = line_start_of(text, close_offset);
        let updated = if close.line > braces.open.line
            && text[close_line_start..close_offset].trim().is_empty()
        {
            splice(text, close_line_start, close_line_start, &format!("{indented}\n"))
        } else {
            let open_offset = offset(text, braces.open.line, braces.open.column)? + 1;
            let content_end = open_offset
                + text[open_offset..close_offset].trim_end_matches([' ', '\t']).len();
            splice(
                text,
                content_end,
                close_offset,
                &format!("\n{indented}\n{owner_indent}"),
            )
        };

        debug!(
            closure = %tree.node(id).name,
            line = close.line,
            "appended fragment into closure"
        );
        Ok(updated)
    }

    /// Inserts `fragment` inside the closure chain `path`, creating whichever
    /// trailing levels are missing. A wholly absent chain is appended at the
    /// end of the document.
    pub fn insert_at_path(
        &self,
        text: &str,
        fragment: &str,
        path: &[&str],
    ) -> Result<String, GradleditError> {
        let tree = parse(text);

        for depth in (1..=path.len()).rev() {
            if let Some(&closure) = tree.all_invocations_at_path(&path[..depth]).first() {
                let nested = self.create_invocation_path(fragment, &path[depth..]);
                return self.append_into_closure(text, &tree, closure, &nested);
            }
        }

        debug!(path = ?path, "synthesizing closure chain at end of document");
        Ok(append_at_end(
            text,
            &self.create_invocation_path(fragment, path),
        ))
    }

    /// Wraps `fragment` in nested closures named by `path`, outermost first.
    pub fn create_invocation_path(&self, fragment: &str, path: &[&str]) -> String {
        path.iter()
            .rev()
            .fold(fragment.trim_end_matches('\n').to_string(), |inner, name| {
                if inner.is_empty() {
                    format!("{name} {{\n}}")
                } else {
                    format!("{name} {{\n{}\n}}", indent_lines(&inner, &self.indent_unit))
                }
            })
    }
}

fn splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut updated = String::with_capacity(text.len() + replacement.len());
    updated.push_str(&text[..start]);
    updated.push_str(replacement);
    updated.push_str(&text[end..]);
    updated
}

pub(crate) fn append_at_end(text: &str, fragment: &str) -> String {
    let mut updated = text.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(fragment.trim_end_matches('\n'));
    updated.push('\n');
    updated
}

fn line_start_of(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].rfind('\n').map_or(0, |index| index + 1)
}

fn leading_whitespace_at(text: &str, position: Position) -> Result<String, GradleditError> {
    let line_start = offset(text, position.line, 1)?;
    Ok(text[line_start..]
        .chars()
        .take_while(|character| matches!(character, ' ' | '\t'))
        .collect())
}

fn first_statement_start(tree: &InvocationTree, id: NodeId) -> Option<Position> {
    let children = tree
        .children(id)
        .iter()
        .map(|child| tree.node(*child).span.start);
    let assignments = tree.assignments_of(id).map(|assignment| assignment.span.start);
    children.chain(assignments).min()
}

fn indent_lines(fragment: &str, indent: &str) -> String {
    fragment
        .trim_end_matches('\n')
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
