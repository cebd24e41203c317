//! Token definitions for `.layout` templates.

use std::fmt;

use crate::span::Span;

/// Kinds of template tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Literal text, escapes already decoded.
    Text,
    /// `\fieldname`
    SimpleCommand,
    /// `\begin{test}`
    FieldBlockStart,
    /// `\end{test}`
    FieldBlockEnd,
    /// `\begingroup{field}`
    GroupBlockStart,
    /// `\endgroup{field}`
    GroupBlockEnd,
    /// `\format[chain]{field}` or `\format{field}`
    OptionField,
    /// `\encoding`
    EncodingMarker,
    /// `\filename`
    FilenameMarker,
    /// `\filepath`
    FilepathMarker,
}

impl TokenKind {
    /// Whether the token text names fields and is matched case-insensitively.
    pub fn carries_field_name(&self) -> bool {
        matches!(
            self,
            TokenKind::SimpleCommand
                | TokenKind::FieldBlockStart
                | TokenKind::FieldBlockEnd
                | TokenKind::GroupBlockStart
                | TokenKind::GroupBlockEnd
        )
    }

    /// The end kind closing this start kind.
    pub fn closing_kind(&self) -> Option<TokenKind> {
        match self {
            TokenKind::FieldBlockStart => Some(TokenKind::FieldBlockEnd),
            TokenKind::GroupBlockStart => Some(TokenKind::GroupBlockEnd),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command = match self {
            TokenKind::Text => return write!(f, "text"),
            TokenKind::SimpleCommand => return write!(f, "field reference"),
            TokenKind::FieldBlockStart => "\\begin",
            TokenKind::FieldBlockEnd => "\\end",
            TokenKind::GroupBlockStart => "\\begingroup",
            TokenKind::GroupBlockEnd => "\\endgroup",
            TokenKind::OptionField => "\\format",
            TokenKind::EncodingMarker => "\\encoding",
            TokenKind::FilenameMarker => "\\filename",
            TokenKind::FilepathMarker => "\\filepath",
        };
        write!(f, "`{command}`")
    }
}

/// A token with its text and location in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// For an option field, the field payload only.
    pub text: String,
    /// Formatter chain of an option field written `\format[chain]{field}`.
    pub chain: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: impl Into<Span>) -> Self {
        Self {
            kind,
            text: text.into(),
            chain: None,
            span: span.into(),
        }
    }

    /// An option field token with its field and optional formatter chain.
    pub fn option_field(
        field: impl Into<String>,
        chain: Option<String>,
        span: impl Into<Span>,
    ) -> Self {
        Self {
            chain,
            ..Self::new(TokenKind::OptionField, field, span)
        }
    }

    /// The field and formatter chain of an option field.
    pub fn option_parts(&self) -> (&str, Option<&str>) {
        (self.text.as_str(), self.chain.as_deref())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Text => write!(f, "{}", self.text),
            TokenKind::SimpleCommand => write!(f, "\\{}", self.text),
            TokenKind::OptionField => match self.option_parts() {
                (field, Some(chain)) => write!(f, "\\format[{chain}]{{{field}}}"),
                (field, None) => write!(f, "\\format{{{field}}}"),
            },
            TokenKind::EncodingMarker | TokenKind::FilenameMarker | TokenKind::FilepathMarker => {
                write!(f, "{}", self.kind.to_string().trim_matches('`'))
            }
            _ => write!(f, "{}{{{}}}", self.kind.to_string().trim_matches('`'), self.text),
        }
    }
}
