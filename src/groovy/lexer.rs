use crate::span::Position;

/// Rendering of one `$name` or `${expression}` inside an interpolated string.
pub const INTERPOLATION_PLACEHOLDER: &str = "${}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TokenKind {
    Identifier(String),
    /// String without interpolation, number, or boolean; holds the decoded value.
    Literal(String),
    /// Double-quoted string with `$` placeholders rendered as [`INTERPOLATION_PLACEHOLDER`].
    Interpolated(String),
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Dot,
    Assign,
    Semicolon,
    Newline,
    Operator(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) start: Position,
    pub(super) end: Position,
}

pub(super) struct Lexed {
    pub(super) tokens: Vec<Token>,
    pub(super) end: Position,
}

const OPERATOR_CHARS: &[char] = &[
    '+', '-', '*', '/', '%', '<', '>', '!', '&', '|', '^', '~', '?', '@', '=',
];

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

pub(super) fn tokenize(source_text: &str) -> Lexed {
    let mut lexer = Lexer {
        chars: source_text.chars().collect(),
        index: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
    };
    lexer.run();
    let end = lexer.position();
    Lexed {
        tokens: lexer.tokens,
        end,
    }
}

impl Lexer {
    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, distance: usize) -> Option<char> {
        self.chars.get(self.index + distance).copied()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(distance, expected)| self.peek_at(distance) == Some(expected))
    }

    fn bump(&mut self) -> Option<char> {
        let character = self.peek()?;
        self.index += 1;
        if character == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(character)
    }

    fn push(&mut self, kind: TokenKind, start: Position) {
        let end = self.position();
        self.tokens.push(Token { kind, start, end });
    }

    fn run(&mut self) {
        if self.starts_with("#!") {
            self.skip_line_comment();
        }

        while let Some(character) = self.peek() {
            let start = self.position();
            match character {
                ' ' | '\t' | '\r' | '\u{000C}' => {
                    self.bump();
                }
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                '\n' => {
                    self.bump();
                    self.push(TokenKind::Newline, start);
                }
                '/' if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                '\'' | '"' => self.lex_string(character, start),
                '0'..='9' => self.lex_number(start),
                '{' => self.single(TokenKind::LeftBrace, start),
                '}' => self.single(TokenKind::RightBrace, start),
                '(' => self.single(TokenKind::LeftParen, start),
                ')' => self.single(TokenKind::RightParen, start),
                '[' => self.single(TokenKind::LeftBracket, start),
                ']' => self.single(TokenKind::RightBracket, start),
                ',' => self.single(TokenKind::Comma, start),
                ';' => self.single(TokenKind::Semicolon, start),
                ':' if self.peek_at(1) == Some(':') => {
                    self.bump();
                    self.bump();
                    self.push(TokenKind::Operator("::".to_string()), start);
                }
                ':' => self.single(TokenKind::Colon, start),
                '.' if self.peek_at(1) == Some('.') => self.lex_operator(start),
                '.' => self.single(TokenKind::Dot, start),
                '=' if !matches!(self.peek_at(1), Some('=' | '~')) => {
                    self.single(TokenKind::Assign, start)
                }
                character if is_identifier_start(character) => self.lex_identifier(start),
                character if OPERATOR_CHARS.contains(&character) => self.lex_operator(start),
                _ => {
                    self.bump();
                    self.push(TokenKind::Operator(character.to_string()), start);
                }
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: Position) {
        self.bump();
        self.push(kind, start);
    }

    fn skip_line_comment(&mut self) {
        while let Some(character) = self.peek() {
            if character == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) {
        self.bump();
        self.bump();
        while self.peek().is_some() {
            if self.starts_with("*/") {
                self.bump();
                self.bump();
                return;
            }
            self.bump();
        }
    }

    fn lex_identifier(&mut self, start: Position) {
        let mut identifier = String::new();
        while let Some(character) = self.peek() {
            if !is_identifier_part(character) {
                break;
            }
            identifier.push(character);
            self.bump();
        }

        let kind = match identifier.as_str() {
            "true" | "false" => TokenKind::Literal(identifier),
            _ => TokenKind::Identifier(identifier),
        };
        self.push(kind, start);
    }

    fn lex_number(&mut self, start: Position) {
        let mut number = String::new();
        while let Some(character) = self.peek() {
            let continues = character.is_ascii_alphanumeric()
                || character == '_'
                || (character == '.' && self.peek_at(1).is_some_and(|next| next.is_ascii_digit()));
            if !continues {
                break;
            }
            number.push(character);
            self.bump();
        }
        self.push(TokenKind::Literal(number), start);
    }

    fn lex_operator(&mut self, start: Position) {
        let mut operator = String::new();
        while let Some(character) = self.peek() {
            let is_part = OPERATOR_CHARS.contains(&character) || character == '.';
            if !is_part || self.starts_with("//") || self.starts_with("/*") {
                break;
            }
            operator.push(character);
            self.bump();
        }
        self.push(TokenKind::Operator(operator), start);
    }

    fn lex_string(&mut self, quote: char, start: Position) {
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let delimiter_len = if triple { 3 } else { 1 };
        for _ in 0..delimiter_len {
            self.bump();
        }

        let mut value = String::new();
        let mut interpolated = false;

        while let Some(character) = self.peek() {
            if character == quote
                && (!triple
                    || (self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote)))
            {
                for _ in 0..delimiter_len {
                    self.bump();
                }
                break;
            }
            // Single-line strings never run past the end of their line.
            if character == '\n' && !triple {
                break;
            }
            if character == '\\' {
                self.bump();
                self.lex_escape(&mut value);
                continue;
            }
            if character == '$' && quote == '"' && self.lex_interpolation() {
                value.push_str(INTERPOLATION_PLACEHOLDER);
                interpolated = true;
                continue;
            }
            value.push(character);
            self.bump();
        }

        let kind = if interpolated {
            TokenKind::Interpolated(value)
        } else {
            TokenKind::Literal(value)
        };
        self.push(kind, start);
    }

    fn lex_escape(&mut self, value: &mut String) {
        let Some(escaped) = self.bump() else {
            value.push('\\');
            return;
        };
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{0008}'),
            'f' => value.push('\u{000C}'),
            '\n' => {}
            'u' => {
                let digits: String = (0..4).filter_map(|distance| self.peek_at(distance)).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if digits.len() == 4 => {
                        for _ in 0..4 {
                            self.bump();
                        }
                        value.push(decoded);
                    }
                    _ => value.push('u'),
                }
            }
            other => value.push(other),
        }
    }

    /// Consumes `$name`, `$a.b` or `${...}` and reports whether anything was consumed.
    fn lex_interpolation(&mut self) -> bool {
        match self.peek_at(1) {
            Some('{') => {
                self.bump();
                self.bump();
                let mut depth = 1usize;
                while let Some(character) = self.peek() {
                    match character {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                self.bump();
                                break;
                            }
                        }
                        '\'' | '"' => {
                            self.skip_nested_quote(character);
                            continue;
                        }
                        _ => {}
                    }
                    self.bump();
                }
                true
            }
            Some(next) if is_identifier_start(next) && next != '$' => {
                self.bump();
                loop {
                    while self.peek().is_some_and(is_identifier_part) {
                        self.bump();
                    }
                    let dotted = self.peek() == Some('.')
                        && self
                            .peek_at(1)
                            .is_some_and(|after| is_identifier_start(after) && after != '$');
                    if !dotted {
                        break;
                    }
                    self.bump();
                }
                true
            }
            _ => false,
        }
    }

    fn skip_nested_quote(&mut self, quote: char) {
        self.bump();
        while let Some(character) = self.peek() {
            self.bump();
            if character == '\\' {
                self.bump();
            } else if character == quote || character == '\n' {
                break;
            }
        }
    }
}

fn is_identifier_start(character: char) -> bool {
    character.is_alphabetic() || character == '_' || character == '$'
}

fn is_identifier_part(character: char) -> bool {
    character.is_alphanumeric() || character == '_' || character == '$'
}
