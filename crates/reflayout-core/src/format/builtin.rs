//! The built-in formatter table and the simple text formatters.

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::format::{
    Authors, Formatter, HtmlChars, HtmlParagraphs, NameFormatter, ParamFormatter, XmlChars,
    split_argument, unescape_argument,
};

/// Constructor for a formatter instance.
pub type FormatterFactory = fn() -> Box<dyn Formatter>;

/// Factory for any formatter with a `Default` implementation.
pub(crate) fn boxed<F: Formatter + Default + 'static>() -> Box<dyn Formatter> {
    Box::new(F::default())
}

/// Static name → constructor table.
///
/// Names are matched exactly. A dotted name such as
/// `net.sf.jabref.export.layout.format.RemoveBrackets` resolves by its last
/// segment, for templates written against fully-qualified class names.
#[derive(Clone, Default)]
pub struct BuiltinFormatters {
    table: IndexMap<&'static str, FormatterFactory>,
}

impl fmt::Debug for BuiltinFormatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.table.keys()).finish()
    }
}

impl BuiltinFormatters {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table of formatters shipped with this crate.
    pub fn standard() -> Self {
        let entries: [(&'static str, FormatterFactory); 19] = [
            ("AuthorAndsReplacer", boxed::<AuthorAndsReplacer>),
            ("Authors", boxed::<Authors>),
            ("Default", boxed::<DefaultValue>),
            ("FirstPage", boxed::<FirstPage>),
            ("FormatPagesForHTML", boxed::<FormatPagesForHtml>),
            ("HTMLChars", boxed::<HtmlChars>),
            ("HTMLParagraphs", boxed::<HtmlParagraphs>),
            ("IfPlural", boxed::<IfPlural>),
            ("LastPage", boxed::<LastPage>),
            ("NameFormatter", boxed::<NameFormatter>),
            ("RemoveBrackets", boxed::<RemoveBrackets>),
            ("RemoveBracketsAddComma", boxed::<RemoveBracketsAddComma>),
            ("RemoveTilde", boxed::<RemoveTilde>),
            ("RemoveWhitespace", boxed::<RemoveWhitespace>),
            ("Replace", boxed::<Replace>),
            ("ToLowerCase", boxed::<ToLowerCase>),
            ("ToUpperCase", boxed::<ToUpperCase>),
            ("WrapContent", boxed::<WrapContent>),
            ("XMLChars", boxed::<XmlChars>),
        ];
        Self {
            table: entries.into_iter().collect(),
        }
    }

    /// Add or replace an entry.
    pub fn with(mut self, name: &'static str, factory: FormatterFactory) -> Self {
        self.table.insert(name, factory);
        self
    }

    /// Instantiate the formatter registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Formatter>> {
        if let Some(factory) = self.table.get(name) {
            return Some(factory());
        }
        let (_, short) = name.rsplit_once('.')?;
        self.table.get(short).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

/// Removes `{` and `}`.
#[derive(Debug, Default)]
pub struct RemoveBrackets;

impl Formatter for RemoveBrackets {
    fn format(&self, input: &str) -> String {
        input.chars().filter(|&c| c != '{' && c != '}').collect()
    }
}

/// Removes `{` and replaces `}` by a comma.
#[derive(Debug, Default)]
pub struct RemoveBracketsAddComma;

impl Formatter for RemoveBracketsAddComma {
    fn format(&self, input: &str) -> String {
        input
            .chars()
            .filter(|&c| c != '{')
            .map(|c| if c == '}' { ',' } else { c })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct ToLowerCase;

impl Formatter for ToLowerCase {
    fn format(&self, input: &str) -> String {
        input.to_lowercase()
    }
}

#[derive(Debug, Default)]
pub struct ToUpperCase;

impl Formatter for ToUpperCase {
    fn format(&self, input: &str) -> String {
        input.to_uppercase()
    }
}

#[derive(Debug, Default)]
pub struct RemoveWhitespace;

impl Formatter for RemoveWhitespace {
    fn format(&self, input: &str) -> String {
        input.chars().filter(|c| !c.is_whitespace()).collect()
    }
}

/// Replaces LaTeX ties (`~`) by spaces, keeping escaped `\~`.
#[derive(Debug, Default)]
pub struct RemoveTilde;

impl Formatter for RemoveTilde {
    fn format(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut escaped = false;
        for c in input.chars() {
            match c {
                '~' if !escaped => out.push(' '),
                _ => out.push(c),
            }
            escaped = c == '\\' && !escaped;
        }
        out
    }
}

fn split_pages(input: &str) -> Option<(&str, &str)> {
    let (first, rest) = input.split_once('-')?;
    Some((first.trim(), rest.trim_start_matches('-').trim()))
}

/// `123--130` → `123`.
#[derive(Debug, Default)]
pub struct FirstPage;

impl Formatter for FirstPage {
    fn format(&self, input: &str) -> String {
        match split_pages(input) {
            Some((first, _)) => first.to_string(),
            None => input.trim().to_string(),
        }
    }
}

/// `123--130` → `130`.
#[derive(Debug, Default)]
pub struct LastPage;

impl Formatter for LastPage {
    fn format(&self, input: &str) -> String {
        match split_pages(input) {
            Some((_, last)) => last.to_string(),
            None => input.trim().to_string(),
        }
    }
}

/// `123--130` → `123&ndash;130`.
#[derive(Debug, Default)]
pub struct FormatPagesForHtml;

impl Formatter for FormatPagesForHtml {
    fn format(&self, input: &str) -> String {
        input.replace("--", "&ndash;")
    }
}

/// `A and B` → `A & B`; `A and B and C` → `A; B & C`.
#[derive(Debug, Default)]
pub struct AuthorAndsReplacer;

impl Formatter for AuthorAndsReplacer {
    fn format(&self, input: &str) -> String {
        let names: Vec<&str> = input.split(" and ").collect();
        match names.as_slice() {
            [] | [_] => input.to_string(),
            [init @ .., last] => format!("{} & {}", init.join("; "), last),
        }
    }
}

/// `Default(text)`: replaces an empty value by `text`.
#[derive(Debug, Default)]
pub struct DefaultValue {
    fallback: String,
}

impl Formatter for DefaultValue {
    fn format(&self, input: &str) -> String {
        if input.trim().is_empty() {
            self.fallback.clone()
        } else {
            input.to_string()
        }
    }

    fn as_param_mut(&mut self) -> Option<&mut dyn ParamFormatter> {
        Some(self)
    }
}

impl ParamFormatter for DefaultValue {
    fn set_argument(&mut self, argument: &str) {
        self.fallback = unescape_argument(argument);
    }
}

/// `Replace(regex,replacement)`: regular-expression replacement.
///
/// An invalid expression, or a missing argument, leaves the value unchanged.
#[derive(Debug, Default)]
pub struct Replace {
    pattern: Option<Regex>,
    replacement: String,
}

impl Formatter for Replace {
    fn format(&self, input: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(input, self.replacement.as_str())
                .into_owned(),
            None => input.to_string(),
        }
    }

    fn as_param_mut(&mut self) -> Option<&mut dyn ParamFormatter> {
        Some(self)
    }
}

impl ParamFormatter for Replace {
    fn set_argument(&mut self, argument: &str) {
        let mut parts = split_argument(argument).into_iter();
        let (Some(pattern), Some(replacement)) = (parts.next(), parts.next()) else {
            debug!(argument; "Replace formatter needs two arguments");
            return;
        };
        match Regex::new(&pattern) {
            Ok(regex) => {
                self.pattern = Some(regex);
                self.replacement = replacement;
            }
            Err(err) => debug!(pattern = pattern.as_str(); "Invalid Replace pattern: {err}"),
        }
    }
}

/// `WrapContent(before,after)`: surrounds non-empty values.
#[derive(Debug, Default)]
pub struct WrapContent {
    before: String,
    after: String,
}

impl Formatter for WrapContent {
    fn format(&self, input: &str) -> String {
        if input.is_empty() {
            String::new()
        } else {
            format!("{}{}{}", self.before, input, self.after)
        }
    }

    fn as_param_mut(&mut self) -> Option<&mut dyn ParamFormatter> {
        Some(self)
    }
}

impl ParamFormatter for WrapContent {
    fn set_argument(&mut self, argument: &str) {
        let mut parts = split_argument(argument).into_iter();
        self.before = parts.next().unwrap_or_default();
        self.after = parts.next().unwrap_or_default();
    }
}

/// `IfPlural(plural,singular)`: chooses by whether the value lists several
/// names (contains ` and `).
#[derive(Debug, Default)]
pub struct IfPlural {
    plural: String,
    singular: String,
}

impl Formatter for IfPlural {
    fn format(&self, input: &str) -> String {
        if input.is_empty() {
            String::new()
        } else if input.contains(" and ") {
            self.plural.clone()
        } else {
            self.singular.clone()
        }
    }

    fn as_param_mut(&mut self) -> Option<&mut dyn ParamFormatter> {
        Some(self)
    }
}

impl ParamFormatter for IfPlural {
    fn set_argument(&mut self, argument: &str) {
        let mut parts = split_argument(argument).into_iter();
        self.plural = parts.next().unwrap_or_default();
        self.singular = parts.next().unwrap_or_default();
    }
}
