//! Parser for formatter chains: `HTMLChars,Default(n.d.),Replace("a,b")`.
//!
//! Each call is a name with an optional argument in parentheses. The
//! argument text is returned raw; splitting and unescaping it is up to the
//! formatter (see [`reflayout_core::format::split_argument`]).

use log::trace;
use winnow::{
    Parser as _,
    error::{ContextError, ErrMode},
    token::{one_of, take_till, take_while},
};

use reflayout_core::format::FormatterCall;

type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// Formatter calls of a chain, with the names of calls whose argument is
/// never closed.
#[derive(Debug, Default)]
pub(crate) struct ParsedChain {
    pub calls: Vec<FormatterCall>,
    pub unterminated: Vec<String>,
}

/// Parse a formatter chain specification into calls, in order.
///
/// Characters between calls that cannot start a name (commas, spaces) are
/// skipped. A quoted argument without its closing `")` runs to the first
/// `)` instead. A `(` that is never closed yields the call without argument.
pub fn parse_formatter_chain(spec: &str) -> Vec<FormatterCall> {
    parse_chain(spec).calls
}

pub(crate) fn parse_chain(spec: &str) -> ParsedChain {
    let mut input = spec;
    let mut parsed = ParsedChain::default();

    loop {
        skip_separators(&mut input);
        let Ok(name) = identifier(&mut input) else {
            break;
        };

        if !input.starts_with('(') {
            parsed.calls.push(FormatterCall::new(name));
            continue;
        }
        input = &input[1..];

        if let Some((argument, rest)) = argument(input) {
            parsed.calls.push(FormatterCall::with_argument(name, argument));
            input = rest;
            continue;
        }

        trace!(name; "Unterminated formatter argument");
        parsed.unterminated.push(name.to_string());
        match input.strip_prefix('"').and_then(bare_argument) {
            Some((argument, rest)) => {
                parsed.calls.push(FormatterCall::with_argument(name, argument));
                input = rest;
            }
            None => {
                parsed.calls.push(FormatterCall::new(name));
                break;
            }
        }
    }

    parsed
}

fn skip_separators(input: &mut &str) {
    let _: IResult<&str> =
        take_till(0.., |c: char| c.is_alphabetic() || c == '_').parse_next(input);
}

/// A letter or `_`, then letters, digits, `_` and `.`.
fn identifier<'s>(input: &mut &'s str) -> IResult<&'s str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '.'),
    )
        .take()
        .parse_next(input)
}

/// Read an argument after its `(`. Returns the raw argument and the input
/// after the closing `)`, or `None` if the argument is never closed.
fn argument(input: &str) -> Option<(&str, &str)> {
    match input.strip_prefix('"') {
        Some(quoted) => quoted_argument(quoted),
        None => bare_argument(input),
    }
}

/// A quoted argument ends at the first unescaped `")`. Parentheses inside
/// the quotes are literal.
fn quoted_argument(input: &str) -> Option<(&str, &str)> {
    let bytes = input.as_bytes();
    let mut escaped = false;

    for (index, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'"' if bytes.get(index + 1) == Some(&b')') => {
                return Some((&input[..index], &input[index + 2..]));
            }
            _ => {}
        }
    }
    None
}

/// A bare argument ends at the `)` matching the opening one.
fn bare_argument(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (index, b) in input.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' if depth == 0 => return Some((&input[..index], &input[index + 1..])),
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calls(spec: &str) -> Vec<(String, Vec<String>)> {
        parse_formatter_chain(spec)
            .into_iter()
            .map(|call| (call.name().to_string(), call.argument_parts().to_vec()))
            .collect()
    }

    fn call(name: &str, parts: &[&str]) -> (String, Vec<String>) {
        (
            name.to_string(),
            parts.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn test_quoted_argument_keeps_commas() {
        assert_eq!(
            calls("Foo(\"a,b\"),Bar"),
            [call("Foo", &["a,b"]), call("Bar", &[])]
        );
    }

    #[test]
    fn test_bare_arguments() {
        assert_eq!(
            calls("HTMLChars, Default(n.d.) ,ToUpperCase"),
            [
                call("HTMLChars", &[]),
                call("Default", &["n.d."]),
                call("ToUpperCase", &[]),
            ]
        );
    }

    #[test]
    fn test_bare_argument_nested_parentheses() {
        assert_eq!(calls("WrapContent((,))"), [call("WrapContent", &["(,)"])]);
    }

    #[test]
    fn test_quoted_argument_with_parenthesis() {
        assert_eq!(
            calls("Replace(\"(x)\\\")\",y\"),Z"),
            [call("Replace", &["(x)\\\")\",y"]), call("Z", &[])]
        );
        assert_eq!(calls("Default(\")\")"), [call("Default", &[")"])]);
    }

    #[test]
    fn test_quoted_argument_ignores_parenthesis_depth() {
        assert_eq!(
            calls("Default(\"(\"),ToUpperCase"),
            [call("Default", &["("]), call("ToUpperCase", &[])]
        );
        assert_eq!(
            calls("Default(\"a(b\"),RemoveBrackets"),
            [call("Default", &["a(b"]), call("RemoveBrackets", &[])]
        );
    }

    #[test]
    fn test_escapes_are_returned_raw() {
        assert_eq!(calls("Replace(\\,,;)"), [call("Replace", &["\\,,;"])]);
    }

    #[test]
    fn test_dotted_names() {
        assert_eq!(
            calls("net.sf.jabref.export.layout.format.ToLowerCase"),
            [call("net.sf.jabref.export.layout.format.ToLowerCase", &[])]
        );
    }

    #[test]
    fn test_unterminated_argument() {
        assert_eq!(
            calls("RemoveBrackets,Default(n.d."),
            [call("RemoveBrackets", &[]), call("Default", &[])]
        );
        assert_eq!(calls("Default(\"n.d."), [call("Default", &[])]);
    }

    #[test]
    fn test_unclosed_quote_falls_back_to_parenthesis() {
        let parsed = parse_chain("Default(\"n.d.),ToUpperCase");
        assert_eq!(parsed.unterminated, ["Default"]);
        assert_eq!(
            parsed.calls,
            [
                FormatterCall::with_argument("Default", "n.d."),
                FormatterCall::new("ToUpperCase"),
            ]
        );

        assert!(parse_chain("Default(\"(\"),X").unterminated.is_empty());
    }

    #[test]
    fn test_empty_and_junk() {
        assert!(calls("").is_empty());
        assert!(calls(" , 123 ").is_empty());
        assert_eq!(calls("Empty()"), [call("Empty", &[""])]);
    }
}
