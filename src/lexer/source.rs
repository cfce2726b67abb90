use std::{iter::Peekable, str::Chars};

/// A two-operation character source. `None` marks the end of input and is
/// returned on every call past it.
pub trait CharSource {
    /// Returns the next character without consuming it.
    fn peek(&mut self) -> Option<char>;

    /// Consumes and returns the next character.
    fn next(&mut self) -> Option<char>;
}

/// In-memory source over a string slice.
#[derive(Debug, Clone)]
pub struct StringSource<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> StringSource<'src> {
    pub fn new(source: &'src str) -> Self {
        StringSource { source, pos: 0 }
    }

    /// Byte offset of the next character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remainder(&self) -> &'src str {
        &self.source[self.pos..]
    }
}

impl CharSource for StringSource<'_> {
    fn peek(&mut self) -> Option<char> {
        self.remainder().chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.remainder().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

/// Streaming source over any character iterator.
#[derive(Debug)]
pub struct IterSource<I: Iterator<Item = char>> {
    chars: Peekable<I>,
}

impl<I: Iterator<Item = char>> IterSource<I> {
    pub fn new(chars: I) -> Self {
        IterSource {
            chars: chars.peekable(),
        }
    }
}

impl<'a> From<Chars<'a>> for IterSource<Chars<'a>> {
    fn from(chars: Chars<'a>) -> Self {
        IterSource::new(chars)
    }
}

impl<I: Iterator<Item = char>> CharSource for IterSource<I> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next(&mut self) -> Option<char> {
        self.chars.next()
    }
}
