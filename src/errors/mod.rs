//! Error types and error handling for the front end.
//!
//! This module defines the positioned lexical error used by the lexer
//! and the keyword configuration. It includes:
//!
//! - Error structures with line/column information
//! - Specific error variants for unrecognised input and over-long lexemes
//! - Helpful error messages and suggestions
//!
//! Arena failures are reported separately through `arena::ArenaError`,
//! since they carry no source position.

pub mod errors;
