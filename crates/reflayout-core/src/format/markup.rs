//! Formatters targeting HTML and XML output.

use crate::format::Formatter;

/// Accent commands and the HTML entity suffix they produce, e.g. `\"o` →
/// `&ouml;`.
const ACCENTS: &[(char, &str)] = &[
    ('"', "uml"),
    ('\'', "acute"),
    ('`', "grave"),
    ('^', "circ"),
    ('~', "tilde"),
    ('c', "cedil"),
];

/// Font commands and the HTML element they map to.
const FONT_COMMANDS: &[(&str, &str)] = &[
    ("textit", "i"),
    ("textbf", "b"),
    ("emph", "em"),
    ("textsc", "span"),
    ("texttt", "tt"),
];

/// Commands that stand for a single character.
const SYMBOLS: &[(&str, &str)] = &[
    ("ss", "&szlig;"),
    ("ae", "&aelig;"),
    ("AE", "&AElig;"),
    ("oe", "&oelig;"),
    ("OE", "&OElig;"),
    ("o", "&oslash;"),
    ("O", "&Oslash;"),
    ("aa", "&aring;"),
    ("AA", "&Aring;"),
    ("l", "&#322;"),
    ("L", "&#321;"),
];

/// Converts LaTeX-encoded text to HTML.
///
/// Handles escaped specials (`\&`, `\%`, `\$`, `\#`, `\_`), accents
/// (`\"{o}`, `\'e`), a few font commands (`\emph{x}` → `<em>x</em>`),
/// dashes and ties. Braces are dropped; unknown commands are kept as written.
#[derive(Debug, Default)]
pub struct HtmlChars;

impl HtmlChars {
    /// Read a command argument: `{text}` or a single character.
    fn argument(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut depth = 1;
                let mut out = String::new();
                for c in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    out.push(c);
                }
                out
            }
            Some(_) => chars.next().map(String::from).unwrap_or_default(),
            None => String::new(),
        }
    }

    fn accent(base: &str, suffix: &str) -> String {
        let letters: String = base.chars().filter(|c| *c != '{' && *c != '}').collect();
        let mut chars = letters.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_alphabetic() => format!("&{letter}{suffix};"),
            _ => letters,
        }
    }
}

impl Formatter for HtmlChars {
    fn format(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let Some(&next) = chars.peek() else {
                        out.push('\\');
                        break;
                    };
                    if let Some(&(_, suffix)) = ACCENTS.iter().find(|(a, _)| *a == next) {
                        chars.next();
                        let base = Self::argument(&mut chars);
                        out.push_str(&Self::accent(&base, suffix));
                    } else if next.is_ascii_alphabetic() {
                        let mut name = String::new();
                        while let Some(&c) = chars.peek() {
                            if !c.is_ascii_alphabetic() {
                                break;
                            }
                            name.push(c);
                            chars.next();
                        }
                        if let Some(&(_, tag)) = FONT_COMMANDS.iter().find(|(n, _)| *n == name) {
                            let body = Self::argument(&mut chars);
                            out.push_str(&format!("<{tag}>{}</{tag}>", self.format(&body)));
                        } else if let Some(&(_, entity)) = SYMBOLS.iter().find(|(n, _)| *n == name)
                        {
                            out.push_str(entity);
                        } else {
                            out.push('\\');
                            out.push_str(&name);
                        }
                    } else {
                        chars.next();
                        match next {
                            '&' => out.push_str("&amp;"),
                            '%' | '$' | '#' | '_' | '{' | '}' => out.push(next),
                            '\\' => out.push_str("<br>"),
                            other => {
                                out.push('\\');
                                out.push(other);
                            }
                        }
                    }
                }
                '{' | '}' => {}
                '~' => out.push_str("&nbsp;"),
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    if chars.peek() == Some(&'-') {
                        chars.next();
                        out.push_str("&mdash;");
                    } else {
                        out.push_str("&ndash;");
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }
}

/// Escapes XML special characters and encodes non-ASCII characters as
/// numeric character references.
#[derive(Debug, Default)]
pub struct XmlChars;

impl Formatter for XmlChars {
    fn format(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                '{' | '}' => {}
                c if c.is_ascii() => out.push(c),
                c => out.push_str(&format!("&#{};", u32::from(c))),
            }
        }
        out
    }
}

/// Wraps paragraphs, separated by blank lines, in `<p>` elements.
#[derive(Debug, Default)]
pub struct HtmlParagraphs;

impl Formatter for HtmlParagraphs {
    fn format(&self, input: &str) -> String {
        let normalized = input.replace("\r\n", "\n");
        let mut paragraphs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in normalized.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(current.join("\n"));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            paragraphs.push(current.join("\n"));
        }
        paragraphs
            .iter()
            .map(|p| format!("<p>\n{p}\n</p>"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
