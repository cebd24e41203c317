//! Field resolution: aliases, pseudo-fields and string-reference expansion.
//!
//! The layout interpreter never reads [`Entry`] fields directly. It goes
//! through a [`FieldResolver`], so callers can plug in their own data model
//! (cross-reference inheritance, computed fields, ...). [`BibFieldResolver`]
//! is the default implementation.

use log::trace;

use crate::entry::{Database, Entry};

/// Maximum nesting of `#string#` references followed during expansion.
const MAX_EXPANSION_DEPTH: usize = 10;

/// Field pairs that stand in for each other when one of them is absent.
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("journal", "journaltitle"),
    ("address", "location"),
    ("school", "institution"),
    ("annote", "annotation"),
    ("key", "sortkey"),
];

/// Narrow interface between the layout engine and the bibliographic model.
pub trait FieldResolver: Send + Sync {
    /// Resolve a field (or alias, or pseudo-field) of `entry`.
    ///
    /// Returns `None` when the field is absent or empty.
    fn resolve(&self, field: &str, entry: &Entry, database: &Database) -> Option<String>;

    /// Expand a literal piece of text at database level, substituting
    /// `#name#` string references.
    fn database_level_text(&self, text: &str, database: &Database) -> String;
}

/// Default resolver for BibTeX-like entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct BibFieldResolver;

impl BibFieldResolver {
    pub fn new() -> Self {
        Self
    }

    fn raw_field(field: &str, entry: &Entry) -> Option<String> {
        match field {
            "entrytype" | "bibtextype" => return Some(entry.entry_type().to_string()),
            "citationkey" | "bibtexkey" => return entry.citation_key().map(str::to_string),
            _ => {}
        }

        if let Some(value) = entry.field(field) {
            return Some(value.to_string());
        }

        let alias = FIELD_ALIASES.iter().find_map(|&(a, b)| {
            if a == field {
                Some(b)
            } else if b == field {
                Some(a)
            } else {
                None
            }
        });
        if let Some(value) = alias.and_then(|alias| entry.field(alias)) {
            trace!(field, alias; "Resolved field through alias");
            return Some(value.to_string());
        }

        match field {
            "year" => entry.field("date").and_then(year_from_date),
            "month" => entry.field("date").and_then(month_from_date),
            _ => None,
        }
    }
}

impl FieldResolver for BibFieldResolver {
    fn resolve(&self, field: &str, entry: &Entry, database: &Database) -> Option<String> {
        let field = field.trim().to_lowercase();
        let raw = Self::raw_field(&field, entry)?;
        let expanded = expand_strings(&raw, database);
        if expanded.is_empty() {
            None
        } else {
            Some(expanded)
        }
    }

    fn database_level_text(&self, text: &str, database: &Database) -> String {
        expand_strings(text, database)
    }
}

fn year_from_date(date: &str) -> Option<String> {
    let year: String = date.chars().take(4).collect();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}

fn month_from_date(date: &str) -> Option<String> {
    let mut parts = date.split('-');
    year_from_date(parts.next()?)?;
    let month = parts.next()?;
    (month.len() == 2 && month.chars().all(|c| c.is_ascii_digit())).then(|| month.to_string())
}

/// Expand `#name#` string references in `text` using the database's string
/// constants.
///
/// Expansion is recursive up to a fixed depth. Unknown references, and
/// references that are still pending when the depth runs out, are kept
/// literally.
pub fn expand_strings(text: &str, database: &Database) -> String {
    expand_at_depth(text, database, 0)
}

fn expand_at_depth(text: &str, database: &Database, depth: usize) -> String {
    if depth >= MAX_EXPANSION_DEPTH || !text.contains('#') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('#') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('#') {
            Some(end) => {
                let name = &after[..end];
                match database.string(name) {
                    Some(value) if !name.is_empty() => {
                        out.push_str(&expand_at_depth(value, database, depth + 1));
                        rest = &after[end + 1..];
                    }
                    _ => {
                        // Not a reference; keep the first `#` and rescan from the second.
                        out.push('#');
                        rest = after;
                    }
                }
            }
            None => {
                out.push('#');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
