use lazy_static::lazy_static;
use regex::Regex;
use std::{collections::HashMap, fmt::Display};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("fall", TokenKind::Fall);
        map.insert("fn", TokenKind::Fn);
        map.insert("for", TokenKind::For);
        map.insert("i16", TokenKind::I16);
        map.insert("i8", TokenKind::I8);
        map.insert("if", TokenKind::If);
        map.insert("let", TokenKind::Let);
        map.insert("return", TokenKind::Return);
        map.insert("struct", TokenKind::Struct);
        map.insert("switch", TokenKind::Switch);
        map.insert("u16", TokenKind::U16);
        map.insert("u8", TokenKind::U8);
        map.insert("union", TokenKind::Union);
        map
    };
    static ref IDENTIFIER_PATTERN: Regex = Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    Invalid,
    EOF,

    // Reserved
    Break,
    Continue,
    Fall,
    Fn,
    For,
    Function,
    If,
    Impl,
    Interface,
    Let,
    Return,
    Class,
    Struct,
    Union,
    Switch,
    Type,
    Enum,
    Bool,
    Default,
    Else,
    Int,
    Skip,
    String,
    Uint,
    Null,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,

    Identifier,
    Integer,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,        // =
    EqualEqual,   // ==
    NotEqual,     // !=
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    Not,
    Arrow,        // ->
    And,          // &&
    Or,           // ||

    Semicolon,
    Colon,
    DoubleColon,
    Dot,
    Comma,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        use TokenKind::*;

        matches!(
            self,
            Break
                | Continue
                | Fall
                | Fn
                | For
                | Function
                | If
                | Impl
                | Interface
                | Let
                | Return
                | Class
                | Struct
                | Union
                | Switch
                | Type
                | Enum
                | Bool
                | Default
                | Else
                | Int
                | Skip
                | String
                | Uint
                | Null
                | I8
                | I16
                | I32
                | I64
                | U8
                | U16
                | U32
                | U64
                | F32
                | F64
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A classified lexeme. `value` holds the text as written, cut to the
/// lexer's maximum lexeme length when `truncated` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
    pub truncated: bool,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.kind)?;
        if !self.value.is_empty() {
            write!(f, " {:?}", self.value)?;
        }
        if self.truncated {
            write!(f, " (truncated)")?;
        }
        Ok(())
    }
}

impl Token {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EOF
    }

    /// The lexical error this token stands for, if any.
    pub fn to_error(&self) -> Option<Error> {
        if self.kind == TokenKind::Invalid {
            let character = self.value.chars().next().unwrap_or('\0');
            return Some(Error::new(
                ErrorImpl::UnrecognisedCharacter { character },
                self.position(),
            ));
        }

        if self.truncated {
            return Some(Error::new(
                ErrorImpl::LexemeTooLong {
                    lexeme: self.value.clone(),
                    max: self.value.chars().count(),
                },
                self.position(),
            ));
        }

        None
    }
}

/// Keyword configuration: exact identifier text to keyword kind.
///
/// The lexer consults this table after scanning an identifier, so the
/// surface keyword set can change without touching the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    words: HashMap<String, TokenKind>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        KeywordTable {
            words: RESERVED_LOOKUP
                .iter()
                .map(|(word, kind)| (word.to_string(), *kind))
                .collect(),
        }
    }
}

impl KeywordTable {
    pub fn empty() -> Self {
        KeywordTable {
            words: HashMap::new(),
        }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'a str, TokenKind)>,
    {
        let mut table = KeywordTable::empty();
        for (word, kind) in pairs {
            table.insert(word, kind)?;
        }
        Ok(table)
    }

    /// Adds or replaces a keyword. The word must be identifier-shaped and
    /// the kind must be one of the reserved kinds.
    pub fn insert(&mut self, word: &str, kind: TokenKind) -> Result<(), Error> {
        if !IDENTIFIER_PATTERN.is_match(word) {
            return Err(invalid_keyword(word, "not an identifier"));
        }

        if !kind.is_keyword() {
            return Err(invalid_keyword(
                word,
                &format!("{} is not a keyword kind", kind),
            ));
        }

        self.words.insert(word.to_string(), kind);
        Ok(())
    }

    pub fn lookup(&self, text: &str) -> Option<TokenKind> {
        self.words.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn invalid_keyword(word: &str, reason: &str) -> Error {
    Error::new(
        ErrorImpl::InvalidKeyword {
            word: word.to_string(),
            reason: reason.to_string(),
        },
        Position::start(),
    )
}
