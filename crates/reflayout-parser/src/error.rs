//! Diagnostics produced while loading a template.
//!
//! Template loading is lenient: most problems (an unterminated `{`, a
//! dangling `\end{...}`, an unknown formatter) are recovered from and
//! reported as warnings. Only an empty command name aborts the load.
//!
//! # Overview
//!
//! - [`Diagnostic`] - one error or warning with an optional [`ErrorCode`],
//!   labeled source spans and help text.
//! - [`ParseError`] - the fatal outcome, wrapping one or more diagnostics.
//! - [`Severity`] - error or warning.
//!
//! # Example
//!
//! ```
//! # use reflayout_parser::error::{Diagnostic, ErrorCode};
//! # use reflayout_parser::Span;
//!
//! let diag = Diagnostic::warning("`\\end{title}` closes no open block")
//!     .with_code(ErrorCode::W100)
//!     .with_label(Span::new(12..24), "unmatched end")
//!     .with_help("check the block names of `\\begin` and `\\end`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
