use tracing::{debug, trace};

use crate::{errors::errors::Error, Position, MK_TOKEN};

use super::{
    source::{CharSource, StringSource},
    tokens::{KeywordTable, Token, TokenKind},
};

/// Longest lexeme kept in a token's value: a 16-byte buffer minus its terminator.
pub const DEFAULT_MAX_LEXEME_LEN: usize = 15;

/// Characters that can start an operator or punctuation token. Any of them
/// ends an identifier.
const OPERATOR_CHARS: &str = "+-*/%=!<>&|:;.,()[]{}";

#[derive(Debug, Clone)]
pub struct LexerConfig {
    pub max_lexeme_len: usize,
    pub keywords: KeywordTable,
}

impl Default for LexerConfig {
    fn default() -> Self {
        LexerConfig {
            max_lexeme_len: DEFAULT_MAX_LEXEME_LEN,
            keywords: KeywordTable::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    Scanning,
    SkippingWhitespace,
    InIdentifier,
    InNumber,
    InOperator,
    EmitEof,
}

/// Pull-based tokenizer over a [`CharSource`].
///
/// `next_token` is the only call that moves the stream forward; `peek`
/// caches one token of lookahead and `prev` remembers the last token
/// handed out by `next_token`.
pub struct Lexer<S: CharSource> {
    source: S,
    config: LexerConfig,
    line: usize,
    column: usize,
    pos: usize,
    state: LexState,
    peeked: Option<Token>,
    /// Cursor as it was before the cached lookahead was scanned.
    peek_origin: Option<(usize, usize, usize, LexState)>,
    previous: Option<Token>,
    exhausted: bool,
}

impl<'src> Lexer<StringSource<'src>> {
    pub fn from_text(source: &'src str) -> Self {
        Lexer::new(StringSource::new(source))
    }
}

impl<S: CharSource> Lexer<S> {
    pub fn new(source: S) -> Self {
        Lexer::with_config(source, LexerConfig::default())
    }

    pub fn with_config(source: S, mut config: LexerConfig) -> Self {
        config.max_lexeme_len = config.max_lexeme_len.max(1);

        Lexer {
            source,
            config,
            line: 1,
            column: 1,
            pos: 0,
            state: LexState::Scanning,
            peeked: None,
            peek_origin: None,
            previous: None,
            exhausted: false,
        }
    }

    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// Scanner state as left by the last `next_token`.
    pub fn state(&self) -> LexState {
        match self.peek_origin {
            Some((_, _, _, state)) => state,
            None => self.state,
        }
    }

    /// Line and column of the cursor, as left by the last `next_token`.
    pub fn position(&self) -> Position {
        match self.peek_origin {
            Some((line, column, _, _)) => Position::new(line, column),
            None => Position::new(self.line, self.column),
        }
    }

    /// Number of characters consumed by `next_token` so far.
    pub fn offset(&self) -> usize {
        match self.peek_origin {
            Some((_, _, pos, _)) => pos,
            None => self.pos,
        }
    }

    /// Produces the next token. Past the end of input every call yields
    /// another EOF token at the final position.
    pub fn next_token(&mut self) -> Token {
        let token = match self.peeked.take() {
            Some(token) => {
                self.peek_origin = None;
                token
            }
            None => self.scan(),
        };

        trace!(kind = %token.kind, line = token.line, column = token.column, "token");
        self.previous = Some(token.clone());
        token
    }

    /// Returns the upcoming token without consuming it.
    pub fn peek(&mut self) -> Token {
        if let Some(token) = &self.peeked {
            return token.clone();
        }

        let origin = (self.line, self.column, self.pos, self.state);
        let token = self.scan();
        self.peek_origin = Some(origin);
        self.peeked = Some(token.clone());
        token
    }

    /// The token most recently returned by `next_token`.
    pub fn prev(&self) -> Option<&Token> {
        self.previous.as_ref()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.source.next()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn scan(&mut self) -> Token {
        self.state = LexState::Scanning;

        let mut first = '\0';
        let mut line = self.line;
        let mut column = self.column;

        loop {
            match self.state {
                LexState::Scanning => match self.source.peek() {
                    None => self.state = LexState::EmitEof,
                    Some(c) if is_whitespace(c) => self.state = LexState::SkippingWhitespace,
                    Some(c) => {
                        line = self.line;
                        column = self.column;
                        self.bump();
                        first = c;
                        self.state = if is_identifier_start(c) {
                            LexState::InIdentifier
                        } else if c.is_ascii_digit() {
                            LexState::InNumber
                        } else {
                            LexState::InOperator
                        };
                    }
                },
                LexState::SkippingWhitespace => {
                    while self.source.peek().is_some_and(is_whitespace) {
                        self.bump();
                    }
                    self.state = LexState::Scanning;
                }
                LexState::InIdentifier => {
                    let (value, truncated) = self.take_run(first, |c| !is_separator(c));
                    let kind = if truncated {
                        TokenKind::Identifier
                    } else {
                        self.config
                            .keywords
                            .lookup(&value)
                            .unwrap_or(TokenKind::Identifier)
                    };
                    return self.emit(MK_TOKEN!(kind, value, line, column, truncated));
                }
                LexState::InNumber => {
                    let (value, truncated) = self.take_run(first, |c| c.is_ascii_digit());
                    return self.emit(MK_TOKEN!(TokenKind::Integer, value, line, column, truncated));
                }
                LexState::InOperator => {
                    if first == '/' && self.source.peek() == Some('/') {
                        while self.source.peek().is_some_and(|c| c != '\n') {
                            self.bump();
                        }
                        self.state = LexState::Scanning;
                        continue;
                    }

                    let (kind, value) = self.operator(first);
                    return self.emit(MK_TOKEN!(kind, value, line, column));
                }
                LexState::EmitEof => {
                    return MK_TOKEN!(TokenKind::EOF, String::new(), self.line, self.column);
                }
            }
        }
    }

    fn emit(&mut self, token: Token) -> Token {
        if token.kind == TokenKind::Invalid {
            debug!(value = %token.value, line = token.line, column = token.column, "unrecognised character");
        } else if token.truncated {
            debug!(
                value = %token.value,
                max = self.config.max_lexeme_len,
                line = token.line,
                column = token.column,
                "lexeme truncated"
            );
        }

        self.state = LexState::Scanning;
        token
    }

    /// Consumes characters while `accept` holds, keeping at most
    /// `max_lexeme_len` of them. The rest of the run is still consumed.
    fn take_run(&mut self, first: char, accept: impl Fn(char) -> bool) -> (String, bool) {
        let mut value = String::from(first);
        let mut kept = 1;
        let mut truncated = false;

        while let Some(c) = self.source.peek() {
            if !accept(c) {
                break;
            }
            self.bump();
            if kept < self.config.max_lexeme_len {
                value.push(c);
                kept += 1;
            } else {
                truncated = true;
            }
        }

        (value, truncated)
    }

    /// Longest match: a two-character operator wins over its one-character prefix.
    fn operator(&mut self, first: char) -> (TokenKind, String) {
        let (single, pairs): (Option<TokenKind>, &[(char, TokenKind)]) = match first {
            ';' => (Some(TokenKind::Semicolon), &[]),
            '.' => (Some(TokenKind::Dot), &[]),
            ',' => (Some(TokenKind::Comma), &[]),
            '(' => (Some(TokenKind::LeftParen), &[]),
            ')' => (Some(TokenKind::RightParen), &[]),
            '[' => (Some(TokenKind::LeftBracket), &[]),
            ']' => (Some(TokenKind::RightBracket), &[]),
            '{' => (Some(TokenKind::LeftBrace), &[]),
            '}' => (Some(TokenKind::RightBrace), &[]),
            '=' => (Some(TokenKind::Equal), &[('=', TokenKind::EqualEqual)]),
            '!' => (Some(TokenKind::Not), &[('=', TokenKind::NotEqual)]),
            '<' => (Some(TokenKind::LessThan), &[('=', TokenKind::LessEqual)]),
            '>' => (Some(TokenKind::GreaterThan), &[('=', TokenKind::GreaterEqual)]),
            ':' => (Some(TokenKind::Colon), &[(':', TokenKind::DoubleColon)]),
            '+' => (Some(TokenKind::Plus), &[('=', TokenKind::PlusEqual)]),
            '-' => (Some(TokenKind::Minus), &[('>', TokenKind::Arrow), ('=', TokenKind::MinusEqual)]),
            '*' => (Some(TokenKind::Star), &[('=', TokenKind::StarEqual)]),
            '/' => (Some(TokenKind::Slash), &[('=', TokenKind::SlashEqual)]),
            '%' => (Some(TokenKind::Percent), &[('=', TokenKind::PercentEqual)]),
            '&' => (None, &[('&', TokenKind::And)]),
            '|' => (None, &[('|', TokenKind::Or)]),
            _ => (None, &[]),
        };

        if let Some(next) = self.source.peek() {
            if let Some((second, kind)) = pairs.iter().find(|(second, _)| *second == next) {
                self.bump();
                return (*kind, [first, *second].iter().collect());
            }
        }

        (single.unwrap_or(TokenKind::Invalid), String::from(first))
    }
}

impl<S: CharSource> Iterator for Lexer<S> {
    type Item = Token;

    /// Yields every token up to and including a single EOF token.
    fn next(&mut self) -> Option<Token> {
        if self.exhausted {
            return None;
        }

        let token = self.next_token();
        if token.is_eof() {
            self.exhausted = true;
        }
        Some(token)
    }
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_separator(c: char) -> bool {
    is_whitespace(c) || OPERATOR_CHARS.contains(c)
}

/// Tokenizes the whole source with the default configuration. Lexical
/// errors stay in the stream as `Invalid` or truncated tokens.
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with(source, LexerConfig::default())
}

pub fn tokenize_with(source: &str, config: LexerConfig) -> Vec<Token> {
    Lexer::with_config(StringSource::new(source), config).collect()
}

/// Like [`tokenize_with`], but the first lexical error aborts with an `Err`.
pub fn tokenize_strict(source: &str, config: LexerConfig) -> Result<Vec<Token>, Error> {
    let mut tokens = vec![];

    for token in Lexer::with_config(StringSource::new(source), config) {
        if let Some(error) = token.to_error() {
            return Err(error);
        }
        tokens.push(token);
    }

    Ok(tokens)
}
