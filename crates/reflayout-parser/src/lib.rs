//! # reflayout-parser
//!
//! Turns `.layout` template text into a tree of [`LayoutNode`]s:
//!
//! 1. [`tokenize`] - the lexer, producing a flat [`Token`] stream.
//! 2. [`build_forest`] - block matching and eager formatter resolution.
//!
//! [`parse`] runs both and collects the warnings of each step.
//!
//! # Example
//!
//! ```
//! use reflayout_core::FormatterRegistry;
//! use reflayout_parser::{LayoutNode, parse};
//!
//! let registry = FormatterRegistry::default();
//! let forest = parse("\\author: \\format[ToUpperCase]{\\title}", &registry).unwrap();
//!
//! assert!(matches!(&forest.nodes[0], LayoutNode::FieldRef(name) if name == "author"));
//! assert!(forest.missing_formatters.is_empty());
//! ```

pub mod error;

mod chain;
mod lexer;
mod span;
mod tokens;
mod tree;

pub use chain::parse_formatter_chain;
pub use error::{Diagnostic, ErrorCode, ParseError};
pub use lexer::{Lexed, tokenize};
pub use span::Span;
pub use tokens::{Token, TokenKind};
pub use tree::{BlockKind, Forest, LayoutNode, build_forest};

use reflayout_core::FormatterRegistry;

/// Tokenize a template and build its tree.
///
/// Warnings from both steps are returned with the [`Forest`], lexer
/// warnings first.
///
/// # Errors
///
/// Fails only when the lexer does; see [`tokenize`].
pub fn parse(text: &str, registry: &FormatterRegistry) -> Result<Forest, ParseError> {
    let Lexed { tokens, warnings } = tokenize(text)?;
    let mut forest = build_forest(&tokens, registry);

    let mut all_warnings = warnings;
    all_warnings.append(&mut forest.warnings);
    forest.warnings = all_warnings;

    Ok(forest)
}
