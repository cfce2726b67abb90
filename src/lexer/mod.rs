//! Lexical analysis module for the front end.
//!
//! This module contains the lexer (tokenizer) that converts source text
//! into a stream of tokens for parsing. It handles:
//!
//! - A hand-written state machine with exact line/column tracking
//! - Keyword/identifier discrimination through a configurable keyword table
//! - Longest-match operator disambiguation
//! - Line comments and whitespace skipping
//! - Recovery from bad input through `Invalid` and truncated tokens

pub mod lexer;
pub mod source;
pub mod tokens;
