use tracing::debug;

use super::{Translator, quote};
use crate::editor::remove_span_with_line;
use crate::error::GradleditError;
use crate::groovy::{Braces, InvocationTree, NodeId, Shape, parse};
use crate::model::Repository;
use crate::span::{Span, offset, span_offsets};

pub const REPOSITORIES_PATH: &[&str] = &["repositories", "maven"];
const URL: &str = "url";

pub(super) struct DeclaredRepository {
    pub repository: Repository,
    pub span: Span,
    pub block: NodeId,
}

pub(super) fn declarations(tree: &InvocationTree) -> Vec<DeclaredRepository> {
    tree.all_invocations_at_path(REPOSITORIES_PATH)
        .into_iter()
        .flat_map(|block| {
            let calls = tree.children(block).iter().filter_map(move |id| {
                let node = tree.node(*id);
                match &node.shape {
                    Shape::String { argument } if node.name == URL => Some(DeclaredRepository {
                        repository: Repository::new(argument),
                        span: node.span,
                        block,
                    }),
                    _ => None,
                }
            });
            let assigned = tree
                .assignments_of(block)
                .filter(|assignment| assignment.target_path == URL)
                .map(move |assignment| DeclaredRepository {
                    repository: Repository::new(&assignment.literal_value),
                    span: assignment.span,
                    block,
                });
            let mut found: Vec<_> = calls.chain(assigned).collect();
            found.sort_by_key(|declared| declared.span.start);
            found
        })
        .collect()
}

/// True when the body of closure `block` holds nothing but `statement`,
/// whitespace, semicolons and comments. Checked on the raw text so that
/// statements the parser skipped still count.
fn body_holds_only(
    text: &str,
    tree: &InvocationTree,
    block: NodeId,
    statement: &Span,
) -> Result<bool, GradleditError> {
    let Some(Braces {
        open,
        close: Some(close),
    }) = tree.closure_body(block).and_then(|body| body.braces)
    else {
        return Ok(false);
    };

    let body_start = offset(text, open.line, open.column)? + '{'.len_utf8();
    let body_end = offset(text, close.line, close.column)?;
    let (start, end) = span_offsets(text, statement)?;
    if start < body_start || end > body_end {
        return Ok(false);
    }
    Ok(is_filler(&text[body_start..start]) && is_filler(&text[end..body_end]))
}

fn is_filler(mut rest: &str) -> bool {
    loop {
        rest = rest
            .trim_start_matches(|character: char| character.is_whitespace() || character == ';');
        if rest.is_empty() {
            return true;
        }
        if let Some(comment) = rest.strip_prefix("//") {
            rest = comment.find('\n').map_or("", |newline| &comment[newline..]);
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = comment.find("*/").map_or("", |close| &comment[close + 2..]);
        } else {
            return false;
        }
    }
}

impl Translator {
    pub fn get_repositories(&self, text: &str) -> Vec<Repository> {
        declarations(&parse(text))
            .into_iter()
            .map(|declared| declared.repository)
            .collect()
    }

    /// Adds a `maven { url '...' }` block inside `repositories`. Each URL gets
    /// its own block so an existing `maven` block is never given a second URL.
    pub fn insert_repository(
        &self,
        text: &str,
        repository: &Repository,
    ) -> Result<String, GradleditError> {
        let (container, block) = REPOSITORIES_PATH.split_at(REPOSITORIES_PATH.len() - 1);
        let fragment = self
            .editor
            .create_invocation_path(&format!("{URL} {}", quote(&repository.url)), block);
        debug!(url = %repository.url, "adding repository");
        self.editor.insert_at_path(text, &fragment, container)
    }

    /// Removes the `url` statement, or its whole `maven` block when nothing
    /// but the URL is written in it.
    pub fn remove_repository(
        &self,
        text: &str,
        repository: &Repository,
    ) -> Result<String, GradleditError> {
        let tree = parse(text);
        let found = declarations(&tree)
            .into_iter()
            .find(|declared| declared.repository == *repository)
            .ok_or_else(|| GradleditError::unremovable(format!("repository '{}'", repository.url)))?;

        let span = if body_holds_only(text, &tree, found.block, &found.span)? {
            tree.node(found.block).span
        } else {
            found.span
        };
        debug!(url = %repository.url, "removing repository");
        remove_span_with_line(text, &span)
    }
}
