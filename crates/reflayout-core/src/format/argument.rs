//! Decoding of formatter arguments.
//!
//! A formatter argument is a raw string taken from a template such as
//! `\format[Replace(\,,;)]{\author}`. Formatters that accept several values
//! separate them with unescaped commas; [`split_argument`] does that split
//! and [`unescape_argument`] decodes a single value.
//!
//! Escapes: `\,` is a comma, `\n` a newline, `\t` a tab and `\\` a
//! backslash. Any other `\X` is kept as written.

/// Separator between parts of a multi-valued argument.
pub const PART_SEPARATOR: char = ',';

/// Decode escape sequences in a single argument value.
pub fn unescape_argument(argument: &str) -> String {
    let mut out = String::with_capacity(argument.len());
    let mut chars = argument.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => push_escaped(&mut out, next),
            None => out.push('\\'),
        }
    }
    out
}

/// Split an argument on unescaped commas and decode every part.
///
/// An empty argument yields a single empty part.
pub fn split_argument(argument: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = argument.chars();
    while let Some(c) = chars.next() {
        match c {
            PART_SEPARATOR => parts.push(std::mem::take(&mut current)),
            '\\' => match chars.next() {
                Some(next) => push_escaped(&mut current, next),
                None => current.push('\\'),
            },
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        ',' => out.push(','),
        'n' => out.push('\n'),
        't' => out.push('\t'),
        '\\' => out.push('\\'),
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}
