use std::collections::BTreeMap;

use super::lexer::{Token, TokenKind, tokenize};
use super::tree::{Assignment, Braces, ClosureBody, Invocation, InvocationTree, NodeId, ROOT, Shape};
use crate::span::{Position, Span};

enum CallArguments {
    Empty,
    Literal(String),
    Named(BTreeMap<String, String>),
}

/// Closures nested deeper than this are skipped like unrecognised statements.
pub const MAX_NESTING_DEPTH: usize = 256;

struct Parser<'a> {
    tokens: &'a [Token],
    cursor: usize,
    depth: usize,
    tree: InvocationTree,
}

/// Builds the invocation tree for a whole script. Never fails: constructs
/// outside the recognised subset are skipped and do not appear in the tree.
pub fn parse(source_text: &str) -> InvocationTree {
    let lexed = tokenize(source_text);
    let document = Span::new(Position::new(1, 1), lexed.end);
    let mut parser = Parser {
        tokens: &lexed.tokens,
        cursor: 0,
        depth: 0,
        tree: InvocationTree::with_root(document),
    };
    parser.parse_block(ROOT);
    parser.tree
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn peek_kind_at(&self, distance: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.cursor + distance).map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(token)
    }

    fn previous_end(&self) -> Position {
        self.tokens[self.cursor - 1].end
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), Some(TokenKind::Newline)) {
            self.cursor += 1;
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightBrace)
        )
    }

    fn parse_block(&mut self, parent: NodeId) -> Option<&'a Token> {
        loop {
            while matches!(
                self.peek_kind(),
                Some(TokenKind::Newline | TokenKind::Semicolon)
            ) {
                self.cursor += 1;
            }

            match self.peek_kind() {
                None => return None,
                Some(TokenKind::RightBrace) => {
                    let closing = self.advance();
                    if parent != ROOT {
                        return closing;
                    }
                }
                Some(_) => self.parse_statement(parent),
            }
        }
    }

    fn parse_statement(&mut self, parent: NodeId) {
        let start_cursor = self.cursor;
        let checkpoint = self.tree.checkpoint(parent);

        if !self.try_statement(parent) {
            self.tree.rollback(checkpoint);
            self.cursor = start_cursor;
            self.skip_statement();
        }
    }

    fn try_statement(&mut self, parent: NodeId) -> bool {
        let Some(name_token) = self.peek() else {
            return false;
        };
        let TokenKind::Identifier(name) = &name_token.kind else {
            return false;
        };
        self.cursor += 1;

        match self.peek_kind() {
            Some(TokenKind::Assign | TokenKind::Dot) => {
                self.try_assignment(parent, name, name_token.start)
            }
            Some(TokenKind::LeftParen) => self.try_parenthesized_call(parent, name, name_token.start),
            Some(TokenKind::LeftBrace) => {
                self.parse_closure_call(parent, name, name_token.start, None, None)
            }
            Some(TokenKind::Identifier(_) | TokenKind::Literal(_))
                if matches!(self.peek_kind_at(1), Some(TokenKind::Colon)) =>
            {
                let Some(entries) = self.parse_named_entries(false) else {
                    return false;
                };
                if !self.at_statement_end() {
                    return false;
                }
                self.push_leaf(parent, name, name_token.start, Shape::Map { entries });
                true
            }
            Some(TokenKind::Literal(argument)) => {
                self.cursor += 1;
                if !self.at_statement_end() {
                    return false;
                }
                self.push_leaf(
                    parent,
                    name,
                    name_token.start,
                    Shape::String {
                        argument: argument.clone(),
                    },
                );
                true
            }
            _ => false,
        }
    }

    fn push_leaf(&mut self, parent: NodeId, name: &str, start: Position, shape: Shape) {
        let span = Span::new(start, self.previous_end());
        self.tree.push_node(
            parent,
            Invocation {
                name: name.to_string(),
                span,
                parent: None,
                shape,
            },
        );
    }

    fn try_assignment(&mut self, parent: NodeId, first: &str, start: Position) -> bool {
        let mut target_path = first.to_string();

        while matches!(self.peek_kind(), Some(TokenKind::Dot)) {
            self.cursor += 1;
            let Some(TokenKind::Identifier(segment)) = self.peek_kind() else {
                return false;
            };
            self.cursor += 1;
            target_path.push('.');
            target_path.push_str(segment);

            if matches!(self.peek_kind(), Some(TokenKind::LeftParen))
                && matches!(self.peek_kind_at(1), Some(TokenKind::RightParen))
            {
                self.cursor += 2;
                target_path.push_str("()");
            }
        }

        if !matches!(self.peek_kind(), Some(TokenKind::Assign)) {
            return false;
        }
        self.cursor += 1;

        let literal_value = match self.peek_kind() {
            Some(TokenKind::Literal(value) | TokenKind::Interpolated(value)) => value.clone(),
            _ => return false,
        };
        self.cursor += 1;

        if !self.at_statement_end() {
            return false;
        }

        self.tree.push_assignment(Assignment {
            target_path,
            literal_value,
            span: Span::new(start, self.previous_end()),
            owner: parent,
        });
        true
    }

    fn try_parenthesized_call(&mut self, parent: NodeId, name: &str, start: Position) -> bool {
        self.cursor += 1;
        self.skip_newlines();

        let arguments = match self.peek_kind() {
            Some(TokenKind::RightParen) => CallArguments::Empty,
            Some(TokenKind::Identifier(_) | TokenKind::Literal(_))
                if matches!(self.peek_kind_at(1), Some(TokenKind::Colon)) =>
            {
                match self.parse_named_entries(true) {
                    Some(entries) => CallArguments::Named(entries),
                    None => return false,
                }
            }
            Some(TokenKind::Literal(value)) => {
                self.cursor += 1;
                self.skip_newlines();
                CallArguments::Literal(value.clone())
            }
            _ => return false,
        };

        if !matches!(self.peek_kind(), Some(TokenKind::RightParen)) {
            return false;
        }
        self.cursor += 1;

        if matches!(self.peek_kind(), Some(TokenKind::LeftBrace)) {
            let (string_argument, map_argument) = match arguments {
                CallArguments::Empty => (None, None),
                CallArguments::Literal(value) => (Some(value), None),
                CallArguments::Named(entries) => (None, Some(entries)),
            };
            return self.parse_closure_call(parent, name, start, string_argument, map_argument);
        }

        if !self.at_statement_end() {
            return false;
        }

        let shape = match arguments {
            CallArguments::Empty => return false,
            CallArguments::Literal(argument) => Shape::String { argument },
            CallArguments::Named(entries) => Shape::Map { entries },
        };
        self.push_leaf(parent, name, start, shape);
        true
    }

    fn parse_closure_call(
        &mut self,
        parent: NodeId,
        name: &str,
        start: Position,
        string_argument: Option<String>,
        map_argument: Option<BTreeMap<String, String>>,
    ) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            return false;
        }
        let Some(open) = self.advance() else {
            return false;
        };

        let id = self.tree.push_node(
            parent,
            Invocation {
                name: name.to_string(),
                span: Span::new(start, open.end),
                parent: None,
                shape: Shape::Closure(ClosureBody {
                    string_argument,
                    map_argument,
                    braces: Some(Braces {
                        open: open.start,
                        close: None,
                    }),
                    ..ClosureBody::default()
                }),
            },
        );

        self.depth += 1;
        let closing = self.parse_block(id);
        self.depth -= 1;
        let end = match closing {
            Some(token) => token.end,
            None => self.tokens.last().map_or(open.end, |token| token.end),
        };

        let node = self.tree.node_mut(id);
        node.span.end = end;
        if let Shape::Closure(body) = &mut node.shape {
            if let Some(braces) = &mut body.braces {
                braces.close = closing.map(|token| token.start);
            }
        }

        self.at_statement_end()
    }

    fn parse_named_entries(&mut self, in_parens: bool) -> Option<BTreeMap<String, String>> {
        let mut entries = BTreeMap::new();

        loop {
            if in_parens {
                self.skip_newlines();
            }

            let key = match self.peek_kind() {
                Some(TokenKind::Identifier(key) | TokenKind::Literal(key)) => key.clone(),
                _ => return None,
            };
            self.cursor += 1;
            if !matches!(self.peek_kind(), Some(TokenKind::Colon)) {
                return None;
            }
            self.cursor += 1;
            if in_parens {
                self.skip_newlines();
            }

            if let Some(value) = self.parse_entry_value(in_parens) {
                entries.insert(key, value);
            }
            if in_parens {
                self.skip_newlines();
            }

            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.cursor += 1;
                    self.skip_newlines();
                }
                Some(TokenKind::RightParen) if in_parens => return Some(entries),
                _ if !in_parens && self.at_statement_end() => return Some(entries),
                _ => return None,
            }
        }
    }

    fn parse_entry_value(&mut self, in_parens: bool) -> Option<String> {
        if let Some(TokenKind::Literal(value)) = self.peek_kind() {
            let ends_entry = match self.peek_kind_at(1) {
                None | Some(TokenKind::Comma) => true,
                Some(TokenKind::RightParen) => in_parens,
                Some(TokenKind::Newline) => true,
                Some(TokenKind::Semicolon | TokenKind::RightBrace) => !in_parens,
                _ => false,
            };
            if ends_entry {
                self.cursor += 1;
                return Some(value.clone());
            }
        }

        let mut depth = 0usize;
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace
                    if depth > 0 =>
                {
                    depth -= 1
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => break,
                TokenKind::Comma if depth == 0 => break,
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 && !in_parens => break,
                _ => {}
            }
            self.cursor += 1;
        }
        None
    }

    /// Consumes one unrecognised statement, keeping brackets balanced and
    /// following Groovy's line continuations.
    fn skip_statement(&mut self) {
        let start_cursor = self.cursor;
        let mut depth = 0usize;
        let mut previous: Option<&TokenKind> = None;

        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::LeftBrace | TokenKind::LeftParen | TokenKind::LeftBracket => depth += 1,
                TokenKind::RightBrace if depth == 0 => break,
                TokenKind::RightBrace | TokenKind::RightParen | TokenKind::RightBracket => {
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Newline if depth == 0 => {
                    if !self.continues_after_newline(previous) {
                        break;
                    }
                }
                _ => {}
            }
            if !matches!(kind, TokenKind::Newline) {
                previous = Some(kind);
            }
            self.cursor += 1;
        }

        if self.cursor == start_cursor && self.peek().is_some() {
            self.cursor += 1;
        }
    }

    fn continues_after_newline(&self, previous: Option<&TokenKind>) -> bool {
        let dangling = matches!(
            previous,
            Some(
                TokenKind::Comma
                    | TokenKind::Dot
                    | TokenKind::Colon
                    | TokenKind::Assign
                    | TokenKind::Operator(_)
            )
        );
        if dangling {
            return true;
        }

        let next = self.tokens[self.cursor..]
            .iter()
            .map(|token| &token.kind)
            .find(|kind| !matches!(kind, TokenKind::Newline));
        matches!(next, Some(TokenKind::Dot))
            || matches!(next, Some(TokenKind::Operator(operator)) if operator == "?.")
    }
}
