use serde::{Deserialize, Serialize};

use crate::error::GradleditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Half-open range: `end` is one past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

pub fn offset(text: &str, line: usize, column: usize) -> Result<usize, GradleditError> {
    let out_of_range = |reason: String| GradleditError::OutOfRange {
        line,
        column,
        reason,
    };

    if line < 1 {
        return Err(out_of_range("line must be at least 1".to_string()));
    }
    if column < 1 {
        return Err(out_of_range("column must be at least 1".to_string()));
    }

    let mut line_start = 0usize;
    for (index, line_text) in text.split('\n').enumerate() {
        if index + 1 == line {
            let line_length = line_text.chars().count();
            if column > line_length + 1 {
                return Err(out_of_range(format!(
                    "line {line} has {line_length} characters"
                )));
            }
            let column_bytes: usize = line_text
                .chars()
                .take(column - 1)
                .map(char::len_utf8)
                .sum();
            return Ok(line_start + column_bytes);
        }
        line_start += line_text.len() + 1;
    }

    let line_count = text.split('\n').count();
    Err(out_of_range(format!("document has {line_count} lines")))
}

pub fn span_offsets(text: &str, span: &Span) -> Result<(usize, usize), GradleditError> {
    let start = offset(text, span.start.line, span.start.column)?;
    let end = offset(text, span.end.line, span.end.column)?;
    if end < start {
        return Err(GradleditError::OutOfRange {
            line: span.end.line,
            column: span.end.column,
            reason: format!(
                "span end precedes its start {}:{}",
                span.start.line, span.start.column
            ),
        });
    }
    Ok((start, end))
}

pub fn position(text: &str, byte_offset: usize) -> Result<Position, GradleditError> {
    if byte_offset > text.len() || !text.is_char_boundary(byte_offset) {
        return Err(GradleditError::OutOfRange {
            line: 0,
            column: 0,
            reason: format!(
                "byte offset {byte_offset} is not a character boundary of a {}-byte document",
                text.len()
            ),
        });
    }

    let before = &text[..byte_offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    let column = before[line_start..].chars().count() + 1;
    Ok(Position::new(line, column))
}
