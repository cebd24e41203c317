//! Bibliographic entries and the database that holds them.
//!
//! The layout engine only reads from these types, through a
//! [`FieldResolver`](crate::resolver::FieldResolver). Both types implement
//! [`serde::Deserialize`] so an entry set can be loaded from a TOML file:
//!
//! ```toml
//! path = "refs.bib"
//!
//! [strings]
//! jan = "January"
//!
//! [[entries]]
//! entry_type = "article"
//! citation_key = "knuth1984"
//! fields = { author = "Donald E. Knuth", title = "Literate Programming" }
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

/// A single bibliographic entry.
///
/// Field names are stored lower-case; lookups through [`Entry::field`] are
/// case-insensitive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    #[serde(default = "default_entry_type")]
    entry_type: String,

    #[serde(default)]
    citation_key: Option<String>,

    #[serde(default, deserialize_with = "deserialize_fields")]
    fields: IndexMap<String, String>,
}

fn default_entry_type() -> String {
    "misc".to_string()
}

fn deserialize_fields<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = IndexMap::<String, String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| (name.to_lowercase(), value))
        .collect())
}

impl Entry {
    /// Create an empty entry of the given type (`article`, `book`, ...).
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into().to_lowercase(),
            citation_key: None,
            fields: IndexMap::new(),
        }
    }

    /// Set the citation key.
    pub fn with_citation_key(mut self, key: impl Into<String>) -> Self {
        self.citation_key = Some(key.into());
        self
    }

    /// Set a field, replacing any previous value.
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_lowercase(), value.into());
    }

    /// The entry type, lower-case.
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    pub fn citation_key(&self) -> Option<&str> {
        self.citation_key.as_deref()
    }

    /// Raw field value, without alias mapping or string expansion.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A reference database: string constants, entries and the file it came from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Database {
    #[serde(default)]
    path: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_strings")]
    strings: IndexMap<String, String>,

    #[serde(default)]
    entries: Vec<Entry>,
}

fn deserialize_strings<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_fields(deserializer)
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path of the file backing this database.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Define a string constant (`@string{jan = "January"}`).
    pub fn with_string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.strings.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn push_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a string constant by name, case-insensitively.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.strings.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
