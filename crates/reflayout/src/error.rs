//! Error types for loading and rendering layouts.
//!
//! [`ReflayoutError`] covers everything that can go wrong around a layout:
//! reading template files, parsing them, configuration and rendering.
//! [`RenderError`] is the narrower error of a single render call.

use std::{io, path::PathBuf};

use thiserror::Error;

use reflayout_parser::ParseError;

/// The main error type for reflayout operations.
///
/// The `Parse` variant keeps the template text next to the diagnostics so
/// they can be reported with source snippets.
#[derive(Debug, Error)]
pub enum ReflayoutError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read template {}: {source}", .path.display())]
    Template { path: PathBuf, source: io::Error },

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid entries file: {0}")]
    Entries(String),

    #[error("A post-formatter is already attached to this layout")]
    PostFormatterAlreadySet,
}

impl ReflayoutError {
    /// Create a new `Parse` error with the associated template text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

/// A node that cannot be rendered in the requested context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// `\encoding`, `\filename` or `\filepath` in an entry layout.
    #[error("`{marker}` is only available in begin and end layouts")]
    DatabaseMarkerInEntry { marker: &'static str },

    /// A field reference or block in a begin or end layout.
    #[error("{what} needs an entry and is not available in begin and end layouts")]
    EntryContentAtDatabaseLevel { what: String },
}
