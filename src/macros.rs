//! Utility macros for the front end.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//!
//! `Token` must be in scope at the call site.

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The lexeme as written
/// * `$line`, `$column` - 1-based position of the first character
/// * `$truncated` - Whether the lexeme was cut at the maximum length (defaults to `false`)
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Integer, "42".to_string(), 1, 1);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $line:expr, $column:expr) => {
        $crate::MK_TOKEN!($kind, $value, $line, $column, false)
    };
    ($kind:expr, $value:expr, $line:expr, $column:expr, $truncated:expr) => {
        Token {
            kind: $kind,
            value: $value,
            line: $line,
            column: $column,
            truncated: $truncated,
        }
    };
}
