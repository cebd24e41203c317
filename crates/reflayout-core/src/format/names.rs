//! Author-list formatters.
//!
//! Author fields use BibTeX conventions: names separated by ` and `, each
//! written either `First von Last` or `von Last, Jr, First`. Braced groups
//! are never split.

use crate::format::{Formatter, ParamFormatter, split_argument, unescape_argument};

/// The parts of a single personal name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorName {
    pub first: Vec<String>,
    pub von: Vec<String>,
    pub last: Vec<String>,
    pub jr: Vec<String>,
}

impl AuthorName {
    /// Parse one name.
    pub fn parse(name: &str) -> Self {
        let segments = split_top_level(name, |rest| rest.starts_with(',').then_some(1));
        match segments.as_slice() {
            [single] => Self::parse_first_last(single),
            [von_last, first] => {
                let (von, last) = split_von_last(&words(von_last));
                Self {
                    first: words(first),
                    von,
                    last,
                    jr: Vec::new(),
                }
            }
            [von_last, jr, first, ..] => {
                let (von, last) = split_von_last(&words(von_last));
                Self {
                    first: words(first),
                    von,
                    last,
                    jr: words(jr),
                }
            }
            [] => Self::default(),
        }
    }

    fn parse_first_last(name: &str) -> Self {
        let all = words(name);
        let Some((last_word, init)) = all.split_last() else {
            return Self::default();
        };
        let von_start = init.iter().position(|w| starts_lowercase(w));
        let (first, von) = match von_start {
            Some(start) => (init[..start].to_vec(), init[start..].to_vec()),
            None => (init.to_vec(), Vec::new()),
        };
        Self {
            first,
            von,
            last: vec![last_word.clone()],
            jr: Vec::new(),
        }
    }

    /// Full first names, space separated.
    pub fn first_full(&self) -> String {
        self.first.join(" ")
    }

    /// Initials with periods: `Donald Ervin` → `D. E.`.
    pub fn first_initials(&self) -> String {
        initials(&self.first)
    }

    pub fn von(&self) -> String {
        self.von.join(" ")
    }

    pub fn last(&self) -> String {
        self.last.join(" ")
    }

    pub fn jr(&self) -> String {
        self.jr.join(" ")
    }

    /// `von Last`, the part sorted on.
    pub fn von_last(&self) -> String {
        self.von
            .iter()
            .chain(&self.last)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split an author field on ` and ` at brace depth zero.
pub fn parse_authors(field: &str) -> Vec<AuthorName> {
    split_top_level(field, |rest| rest.starts_with(" and ").then_some(5))
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .map(|name| AuthorName::parse(&name))
        .collect()
}

/// Split `text` at brace depth zero wherever `separator` matches the
/// remaining input; `separator` returns the byte length to skip.
fn split_top_level(text: &str, separator: impl Fn(&str) -> Option<usize>) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut index = 0;
    while index < text.len() {
        let rest = &text[index..];
        let Some(c) = rest.chars().next() else { break };
        match c {
            '\\' => {
                index += c.len_utf8() + rest[1..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                if let Some(len) = separator(rest) {
                    segments.push(text[start..index].to_string());
                    index += len;
                    start = index;
                    continue;
                }
            }
            _ => {}
        }
        index += c.len_utf8();
    }
    segments.push(text[start..].to_string());
    segments
}

fn words(text: &str) -> Vec<String> {
    split_top_level(text.trim(), |rest| {
        rest.chars()
            .next()
            .filter(|c| c.is_whitespace())
            .map(char::len_utf8)
    })
        .into_iter()
        .filter(|w| !w.is_empty())
        .collect()
}

fn starts_lowercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_lowercase)
}

/// In `von Last`, the von part is the longest prefix of lower-case words that
/// still leaves at least one word for the last name.
fn split_von_last(all: &[String]) -> (Vec<String>, Vec<String>) {
    let Some(last_start) = all
        .iter()
        .rposition(|w| starts_lowercase(w))
        .map(|i| i + 1)
        .filter(|&i| i < all.len())
    else {
        return (Vec::new(), all.to_vec());
    };
    (all[..last_start].to_vec(), all[last_start..].to_vec())
}

fn initials(names: &[String]) -> String {
    names
        .iter()
        .map(|name| {
            name.split('-')
                .filter_map(|part| {
                    part.chars()
                        .find(|c| c.is_alphabetic())
                        .map(|c| format!("{c}."))
                })
                .collect::<Vec<_>>()
                .join("-")
        })
        .filter(|initial| !initial.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_names(names: &[String], separator: &str, last_separator: &str) -> String {
    match names {
        [] => String::new(),
        [single] => single.clone(),
        [init @ .., last] => format!("{}{}{}", init.join(separator), last_separator, last),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum NameOrder {
    #[default]
    FirstFirst,
    LastFirst,
    LastFirstFirstFirst,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum FirstNameStyle {
    #[default]
    FullName,
    Initials,
    LastName,
}

/// `Authors(options)`: reformat an author list.
///
/// Options are comma separated:
///
/// - `FirstFirst` (default), `LastFirst`, `LastFirstFirstFirst`
/// - `FullName` (default), `Initials`, `LastName`
/// - `Sep=...` (default `, `), `LastSep=...` (default ` and `)
/// - `EtAl=n` keeps only the first author when there are more than `n`,
///   followed by `EtAlString=...` (default ` et al.`)
#[derive(Debug, Clone)]
pub struct Authors {
    order: NameOrder,
    style: FirstNameStyle,
    separator: String,
    last_separator: String,
    et_al_limit: Option<usize>,
    et_al: String,
}

impl Default for Authors {
    fn default() -> Self {
        Self {
            order: NameOrder::default(),
            style: FirstNameStyle::default(),
            separator: ", ".to_string(),
            last_separator: " and ".to_string(),
            et_al_limit: None,
            et_al: " et al.".to_string(),
        }
    }
}

impl Authors {
    fn render_name(&self, name: &AuthorName, last_first: bool) -> String {
        let first = match self.style {
            FirstNameStyle::FullName => name.first_full(),
            FirstNameStyle::Initials => name.first_initials(),
            FirstNameStyle::LastName => String::new(),
        };
        let von_last = name.von_last();
        let jr = name.jr();

        let mut out = String::new();
        if last_first {
            out.push_str(&von_last);
            if !jr.is_empty() {
                out.push_str(", ");
                out.push_str(&jr);
            }
            if !first.is_empty() {
                out.push_str(", ");
                out.push_str(&first);
            }
        } else {
            if !first.is_empty() {
                out.push_str(&first);
                out.push(' ');
            }
            out.push_str(&von_last);
            if !jr.is_empty() {
                out.push_str(", ");
                out.push_str(&jr);
            }
        }
        out
    }
}

impl Formatter for Authors {
    fn format(&self, input: &str) -> String {
        let authors = parse_authors(input);
        if authors.is_empty() {
            return input.to_string();
        }

        let last_first = |index: usize| match self.order {
            NameOrder::FirstFirst => false,
            NameOrder::LastFirst => true,
            NameOrder::LastFirstFirstFirst => index == 0,
        };

        if self.et_al_limit.is_some_and(|limit| authors.len() > limit) {
            return format!("{}{}", self.render_name(&authors[0], last_first(0)), self.et_al);
        }

        let names: Vec<String> = authors
            .iter()
            .enumerate()
            .map(|(index, name)| self.render_name(name, last_first(index)))
            .collect();
        join_names(&names, &self.separator, &self.last_separator)
    }

    fn as_param_mut(&mut self) -> Option<&mut dyn ParamFormatter> {
        Some(self)
    }
}

impl ParamFormatter for Authors {
    fn set_argument(&mut self, argument: &str) {
        for option in split_argument(argument) {
            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value)),
                None => (option.trim(), None),
            };
            match (key.to_lowercase().as_str(), value) {
                ("firstfirst", None) => self.order = NameOrder::FirstFirst,
                ("lastfirst", None) => self.order = NameOrder::LastFirst,
                ("lastfirstfirstfirst", None) => self.order = NameOrder::LastFirstFirstFirst,
                ("fullname", None) => self.style = FirstNameStyle::FullName,
                ("initials", None) => self.style = FirstNameStyle::Initials,
                ("lastname", None) => self.style = FirstNameStyle::LastName,
                ("sep", Some(value)) => self.separator = value.to_string(),
                ("lastsep", Some(value)) => self.last_separator = value.to_string(),
                ("etal", Some(value)) => self.et_al_limit = value.trim().parse().ok(),
                ("etalstring", Some(value)) => self.et_al = value.to_string(),
                _ => log::debug!(option = option.as_str(); "Ignoring unknown Authors option"),
            }
        }
    }
}

/// BibTeX-style name pattern, applied to every author.
///
/// The argument is `pattern[,separator[,last separator]]`. In the pattern,
/// a `{...}` group is emitted only when every name part it mentions is
/// non-empty. Inside a group `ff`, `vv`, `ll`, `jj` stand for the full
/// first, von, last and jr parts; `f`, `v`, `l`, `j` for their initials,
/// written `f.` to keep the abbreviation dots.
/// Text outside groups is copied as is.
///
/// `{ff }{vv }{ll}{, jj}` applied to `Knuth, Donald E.` gives
/// `Donald E. Knuth`.
#[derive(Debug, Clone)]
pub struct NameFormatter {
    pattern: String,
    separator: String,
    last_separator: String,
}

impl Default for NameFormatter {
    fn default() -> Self {
        Self {
            pattern: "{ff }{vv }{ll}{, jj}".to_string(),
            separator: ", ".to_string(),
            last_separator: " and ".to_string(),
        }
    }
}

impl NameFormatter {
    /// A name formatter configured from a pattern argument.
    pub fn with_pattern(argument: &str) -> Self {
        let mut formatter = Self::default();
        formatter.set_argument(argument);
        formatter
    }

    fn part(name: &AuthorName, token: &str) -> String {
        match token {
            "ff" => name.first_full(),
            "vv" => name.von(),
            "ll" => name.last(),
            "jj" => name.jr(),
            "f" => initials(&name.first),
            "v" => initials(&name.von),
            "l" => initials(&name.last),
            "j" => initials(&name.jr),
            _ => String::new(),
        }
    }

    fn render_group(group: &str, name: &AuthorName) -> Option<String> {
        let mut out = String::new();
        let mut mentioned = false;
        let mut rest = group;
        while let Some(c) = rest.chars().next() {
            let token_len = match c {
                'f' | 'v' | 'l' | 'j' if rest[1..].starts_with(c) => 2,
                'f' | 'v' | 'l' | 'j' => 1,
                _ => 0,
            };
            if token_len == 0 {
                out.push(c);
                rest = &rest[c.len_utf8()..];
                continue;
            }
            let mut value = Self::part(name, &rest[..token_len]);
            rest = &rest[token_len..];
            // `{f.}` keeps the abbreviation dots, `{f}` drops them.
            if token_len == 1 {
                match rest.strip_prefix('.') {
                    Some(after_dot) => rest = after_dot,
                    None => value.retain(|c| c != '.'),
                }
            }
            if value.is_empty() {
                return None;
            }
            mentioned = true;
            out.push_str(&value);
        }
        mentioned.then_some(out)
    }

    fn render_name(&self, name: &AuthorName) -> String {
        let mut out = String::new();
        let mut rest = self.pattern.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                rest = after;
                break;
            };
            if let Some(group) = Self::render_group(&after[..close], name) {
                out.push_str(&group);
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

impl Formatter for NameFormatter {
    fn format(&self, input: &str) -> String {
        let authors = parse_authors(input);
        if authors.is_empty() {
            return input.to_string();
        }
        let names: Vec<String> = authors.iter().map(|name| self.render_name(name)).collect();
        join_names(&names, &self.separator, &self.last_separator)
    }

    fn as_param_mut(&mut self) -> Option<&mut dyn ParamFormatter> {
        Some(self)
    }
}

impl ParamFormatter for NameFormatter {
    fn set_argument(&mut self, argument: &str) {
        let mut parts = split_top_level(argument, |rest| rest.starts_with(',').then_some(1))
            .into_iter()
            .map(|part| unescape_argument(&part));
        if let Some(pattern) = parts.next() {
            self.pattern = pattern;
        }
        if let Some(separator) = parts.next() {
            self.separator = separator;
        }
        if let Some(last_separator) = parts.next() {
            self.last_separator = last_separator;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors_with(argument: &str) -> Authors {
        let mut formatter = Authors::default();
        formatter.set_argument(argument);
        formatter
    }

    #[test]
    fn test_parse_first_last() {
        let name = AuthorName::parse("Donald Ervin Knuth");
        assert_eq!(name.first, ["Donald", "Ervin"]);
        assert_eq!(name.last, ["Knuth"]);
        assert!(name.von.is_empty());
    }

    #[test]
    fn test_parse_with_von() {
        let name = AuthorName::parse("Ludwig van Beethoven");
        assert_eq!(name.first, ["Ludwig"]);
        assert_eq!(name.von, ["van"]);
        assert_eq!(name.last, ["Beethoven"]);

        let comma = AuthorName::parse("van Beethoven, Ludwig");
        assert_eq!(comma, name);
    }

    #[test]
    fn test_parse_with_jr() {
        let name = AuthorName::parse("King, Jr, Martin Luther");
        assert_eq!(name.first, ["Martin", "Luther"]);
        assert_eq!(name.last, ["King"]);
        assert_eq!(name.jr, ["Jr"]);
    }

    #[test]
    fn test_braced_names_are_not_split() {
        let authors = parse_authors("{Barnes and Noble} and Jane Doe");
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].last, ["{Barnes and Noble}"]);
        assert_eq!(authors[1].last, ["Doe"]);
    }

    #[test]
    fn test_initials() {
        let name = AuthorName::parse("Jean-Paul Sartre");
        assert_eq!(name.first_initials(), "J.-P.");
        let name = AuthorName::parse("Knuth, Donald Ervin");
        assert_eq!(name.first_initials(), "D. E.");
    }

    #[test]
    fn test_authors_default() {
        let formatter = Authors::default();
        assert_eq!(
            formatter.format("Knuth, Donald and Lamport, Leslie and Ada Lovelace"),
            "Donald Knuth, Leslie Lamport and Ada Lovelace"
        );
    }

    #[test]
    fn test_authors_last_first_initials() {
        let formatter = authors_with("LastFirst,Initials,Sep=; ,LastSep= & ");
        assert_eq!(
            formatter.format("Donald Knuth and Leslie Lamport and Ada Lovelace"),
            "Knuth, D.; Lamport, L. & Lovelace, A."
        );
    }

    #[test]
    fn test_authors_last_first_first_first() {
        let formatter = authors_with("LastFirstFirstFirst");
        assert_eq!(
            formatter.format("Donald Knuth and Leslie Lamport"),
            "Knuth, Donald and Leslie Lamport"
        );
    }

    #[test]
    fn test_authors_et_al() {
        let formatter = authors_with("LastName,EtAl=2");
        assert_eq!(formatter.format("A Alpha and B Beta"), "Alpha and Beta");
        assert_eq!(
            formatter.format("A Alpha and B Beta and C Gamma"),
            "Alpha et al."
        );
    }

    #[test]
    fn test_authors_empty_input() {
        assert_eq!(Authors::default().format(""), "");
    }

    #[test]
    fn test_name_formatter_default_pattern() {
        let formatter = NameFormatter::default();
        assert_eq!(formatter.format("Knuth, Donald E."), "Donald E. Knuth");
        assert_eq!(
            formatter.format("van Beethoven, Ludwig and King, Jr, Martin"),
            "Ludwig van Beethoven and Martin King, Jr"
        );
    }

    #[test]
    fn test_name_formatter_custom_pattern() {
        let formatter = NameFormatter::with_pattern(r"{ll}{, f.},; , & ");
        assert_eq!(
            formatter.format("Donald Knuth and Leslie Lamport and Alan Turing"),
            "Knuth, D.; Lamport, L. & Turing, A."
        );
    }

    #[test]
    fn test_name_formatter_comma_inside_group() {
        let formatter = NameFormatter::with_pattern("{ll}{, f.}");
        assert_eq!(
            formatter.format("Donald Knuth and Leslie Lamport"),
            "Knuth, D. and Lamport, L."
        );

        let formatter = NameFormatter::with_pattern(r"{ll}{, ff},; ,\, and ");
        assert_eq!(
            formatter.format("Donald Knuth and Leslie Lamport and Alan Turing"),
            "Knuth, Donald; Lamport, Leslie, and Turing, Alan"
        );
    }

    #[test]
    fn test_name_formatter_bare_initials() {
        let formatter = NameFormatter::with_pattern("{f~}{ll}");
        assert_eq!(formatter.format("Donald Ervin Knuth"), "D E~Knuth");
    }

    #[test]
    fn test_name_formatter_skips_empty_groups() {
        let formatter = NameFormatter::with_pattern("{vv }{ll}");
        assert_eq!(formatter.format("Plato"), "Plato");
    }
}
