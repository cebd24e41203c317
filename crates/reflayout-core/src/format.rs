//! Formatters: named string transforms applied to field values.
//!
//! A template refers to formatters by name, optionally with an argument:
//! `\format[HTMLChars,Default(n.d.)]{\year}`. Names are resolved once, when
//! the template is parsed, through a [`FormatterRegistry`].
//!
//! # Overview
//!
//! - [`Formatter`] - the transform itself; must never fail.
//! - [`ParamFormatter`] - the capability of taking an argument.
//! - [`FormatterCall`] - a name plus raw argument, as written in a template.
//! - [`FormatterRegistry`] - name resolution with a passthrough fallback.
//! - [`FormatterChain`] - resolved formatters applied left to right.

mod argument;
mod builtin;
mod markup;
mod names;
mod registry;

pub use argument::{PART_SEPARATOR, split_argument, unescape_argument};
pub use builtin::{BuiltinFormatters, FormatterFactory};
pub use markup::{HtmlChars, HtmlParagraphs, XmlChars};
pub use names::{AuthorName, Authors, NameFormatter, parse_authors};
pub use registry::{FormatterChain, FormatterHandle, FormatterRegistry};

use std::fmt;

/// A string transform.
///
/// Implementations must not panic and must always return a best-effort
/// result; when the input is not understood it is returned unchanged.
pub trait Formatter: Send + Sync {
    /// Transform `input`.
    fn format(&self, input: &str) -> String;

    /// Access the argument-taking capability, if this formatter has it.
    fn as_param_mut(&mut self) -> Option<&mut dyn ParamFormatter> {
        None
    }
}

/// A formatter that takes an argument, e.g. `Default(n.d.)`.
pub trait ParamFormatter: Formatter {
    /// Set the raw argument. Called at most once, before the first
    /// [`Formatter::format`] call.
    fn set_argument(&mut self, argument: &str);
}

/// Placeholder for a formatter name that could not be resolved.
///
/// Returns its input unchanged.
#[derive(Debug, Clone)]
pub struct NotFoundFormatter {
    name: String,
}

impl NotFoundFormatter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Formatter for NotFoundFormatter {
    fn format(&self, input: &str) -> String {
        input.to_string()
    }
}

/// One element of a formatter chain as written in a template:
/// `Name` or `Name(argument)`.
///
/// `argument_parts` holds the raw argument text, if any. Formatters that take
/// several values split it themselves with [`split_argument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterCall {
    name: String,
    argument_parts: Vec<String>,
}

impl FormatterCall {
    /// A call without argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument_parts: Vec::new(),
        }
    }

    /// A call with a raw argument.
    pub fn with_argument(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument_parts: vec![argument.into()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument_parts(&self) -> &[String] {
        &self.argument_parts
    }

    /// The first argument part, which is what parameterized formatters receive.
    pub fn argument(&self) -> Option<&str> {
        self.argument_parts.first().map(String::as_str)
    }
}

impl fmt::Display for FormatterCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(argument) => write!(f, "{}({})", self.name, argument),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_passthrough() {
        let formatter = NotFoundFormatter::new("Nonexistent");
        assert_eq!(formatter.format("{A} and {B}"), "{A} and {B}");
        assert_eq!(formatter.name(), "Nonexistent");
    }

    #[test]
    fn test_formatter_call_display() {
        assert_eq!(FormatterCall::new("ToLowerCase").to_string(), "ToLowerCase");
        assert_eq!(
            FormatterCall::with_argument("Default", "n.d.").to_string(),
            "Default(n.d.)"
        );
    }

    #[test]
    fn test_formatter_call_argument() {
        let call = FormatterCall::with_argument("Replace", "a,b");
        assert_eq!(call.argument(), Some("a,b"));
        assert_eq!(call.argument_parts().len(), 1);
        assert_eq!(FormatterCall::new("X").argument(), None);
    }
}
