//! Codes for template diagnostics.
//!
//! - `E0xx` - fatal lexer errors
//! - `W0xx` - lexer recoveries
//! - `W1xx` - block structure recoveries
//! - `W2xx` - formatter resolution

use std::fmt;

/// Codes categorizing template diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Empty command name.
    ///
    /// A `\` was followed by a character that cannot start a command name.
    /// Write `\\` for a literal backslash.
    E001,

    /// Unterminated bracketed field.
    ///
    /// The template ended inside `{...}`; the text read so far was kept.
    W001,

    /// Unterminated option field.
    ///
    /// The template ended inside `\format[...]{...}`; the text read so far
    /// was kept.
    W002,

    /// Unmatched block end.
    ///
    /// An `\end{...}` or `\endgroup{...}` closes no open block and was
    /// dropped.
    W100,

    /// Unterminated block.
    ///
    /// A `\begin{...}` or `\begingroup{...}` has no matching end. The start
    /// was dropped and the block contents kept as plain nodes.
    W101,

    /// Nested block with the same name.
    ///
    /// A block of the same kind and name was opened inside another; the
    /// first end closes the outer block.
    W102,

    /// Unknown formatter.
    ///
    /// A formatter name did not resolve; values pass through unchanged.
    W200,

    /// Unterminated formatter argument.
    ///
    /// A formatter argument in a `\format[...]` chain is never closed. A
    /// quoted argument falls back to the first `)`; otherwise the call keeps
    /// no argument.
    W201,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::W001 => "W001",
            ErrorCode::W002 => "W002",
            ErrorCode::W100 => "W100",
            ErrorCode::W101 => "W101",
            ErrorCode::W102 => "W102",
            ErrorCode::W200 => "W200",
            ErrorCode::W201 => "W201",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "empty command name",
            ErrorCode::W001 => "unterminated bracketed field",
            ErrorCode::W002 => "unterminated option field",
            ErrorCode::W100 => "unmatched block end",
            ErrorCode::W101 => "unterminated block",
            ErrorCode::W102 => "nested block with the same name",
            ErrorCode::W200 => "unknown formatter",
            ErrorCode::W201 => "unterminated formatter argument",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
