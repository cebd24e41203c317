//! Export templates: a set of layout files rendering a whole database.
//!
//! An export template named `html` in a directory consists of:
//!
//! | File | Role |
//! |---|---|
//! | `html.begin.layout` | optional, rendered once before the entries |
//! | `html.layout` | required, rendered for each entry |
//! | `html.<type>.layout` | optional, replaces `html.layout` for entries of that type |
//! | `html.end.layout` | optional, rendered once after the entries |
//!
//! Begin and end layouts are rendered at database level and may use
//! `\encoding`, `\filename` and `\filepath`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, info, warn};

use reflayout_core::{Database, FieldResolver, FormatterRegistry};

use crate::{error::ReflayoutError, layout::Layout, session::RenderSession};

const LAYOUT_EXTENSION: &str = "layout";

/// The layouts of one export format.
#[derive(Debug)]
pub struct ExportTemplate {
    name: String,
    begin: Option<Layout>,
    main: Layout,
    /// Keyed by lower-case entry type.
    by_type: IndexMap<String, Layout>,
    end: Option<Layout>,
    missing_formatters: Vec<String>,
}

impl ExportTemplate {
    /// Load the template `name` from `dir`.
    ///
    /// # Errors
    ///
    /// Fails if `name.layout` is missing or any file cannot be read or
    /// parsed.
    pub fn load(
        dir: impl AsRef<Path>,
        name: &str,
        registry: &FormatterRegistry,
    ) -> Result<Self, ReflayoutError> {
        let dir = dir.as_ref();
        info!(dir = dir.display().to_string(), name; "Loading export template");

        let main = load_layout(&layout_path(dir, name, None), registry)?;
        let begin = load_optional(&layout_path(dir, name, Some("begin")), registry)?;
        let end = load_optional(&layout_path(dir, name, Some("end")), registry)?;

        let mut by_type = IndexMap::new();
        for (entry_type, path) in type_layout_paths(dir, name)? {
            debug!(entry_type = entry_type.as_str(); "Found entry type layout");
            by_type.insert(entry_type, load_layout(&path, registry)?);
        }

        let mut missing_formatters: Vec<String> = Vec::new();
        let layouts = begin.iter().chain([&main]).chain(by_type.values()).chain(end.iter());
        for layout in layouts {
            for missing in layout.missing_formatters() {
                if !missing_formatters.contains(missing) {
                    missing_formatters.push(missing.clone());
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            begin,
            main,
            by_type,
            end,
            missing_formatters,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Formatter names that did not resolve in any of the files, each listed
    /// once.
    pub fn missing_formatters(&self) -> &[String] {
        &self.missing_formatters
    }

    /// Entry types with a dedicated layout.
    pub fn entry_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    /// The layout used for entries of `entry_type`.
    pub fn layout_for(&self, entry_type: &str) -> &Layout {
        self.by_type
            .get(&entry_type.to_lowercase())
            .unwrap_or(&self.main)
    }

    /// Attach a post-formatter to the entry layouts, creating one instance
    /// per layout from `registry`.
    ///
    /// # Errors
    ///
    /// Fails if `name` does not resolve or a post-formatter is already set.
    pub fn set_post_formatter(
        &mut self,
        name: &str,
        registry: &FormatterRegistry,
    ) -> Result<(), ReflayoutError> {
        for layout in [&mut self.main].into_iter().chain(self.by_type.values_mut()) {
            let formatter = registry
                .create(name)
                .ok_or_else(|| ReflayoutError::Config(format!("Unknown post-formatter `{name}`")))?;
            layout.set_post_formatter(formatter)?;
        }
        Ok(())
    }

    /// Render the whole database: begin, every entry, end.
    ///
    /// One [`RenderSession`] is shared by all entries, so group headers are
    /// not repeated for consecutive entries.
    ///
    /// # Errors
    ///
    /// Fails if a layout uses a node that is invalid in its position (see
    /// [`RenderError`](crate::RenderError)).
    pub fn render(
        &self,
        database: &Database,
        resolver: &dyn FieldResolver,
        encoding: &str,
    ) -> Result<String, ReflayoutError> {
        let mut output = String::new();

        if let Some(begin) = &self.begin {
            output.push_str(&begin.render_database_level(database, resolver, encoding)?);
        }

        let mut session = RenderSession::new();
        for entry in database.entries() {
            let layout = self.layout_for(entry.entry_type());
            output.push_str(&layout.render_entry(entry, database, resolver, &mut session)?);
        }

        if let Some(end) = &self.end {
            output.push_str(&end.render_database_level(database, resolver, encoding)?);
        }

        info!(
            template = self.name.as_str(),
            entries = database.entries().len();
            "Database rendered"
        );
        Ok(output)
    }
}

fn layout_path(dir: &Path, name: &str, infix: Option<&str>) -> PathBuf {
    match infix {
        Some(infix) => dir.join(format!("{name}.{infix}.{LAYOUT_EXTENSION}")),
        None => dir.join(format!("{name}.{LAYOUT_EXTENSION}")),
    }
}

/// `name.<type>.layout` files in `dir`, sorted by entry type.
fn type_layout_paths(dir: &Path, name: &str) -> Result<Vec<(String, PathBuf)>, ReflayoutError> {
    let entries = fs::read_dir(dir).map_err(|source| ReflayoutError::Template {
        path: dir.to_path_buf(),
        source,
    })?;

    let prefix = format!("{name}.");
    let suffix = format!(".{LAYOUT_EXTENSION}");
    let mut paths: Vec<(String, PathBuf)> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?;
            let entry_type = file_name.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
            let valid = !entry_type.is_empty()
                && !entry_type.contains('.')
                && !matches!(entry_type, "begin" | "end");
            valid.then(|| (entry_type.to_lowercase(), path.clone()))
        })
        .collect();

    paths.sort();
    Ok(paths)
}

fn load_layout(path: &Path, registry: &FormatterRegistry) -> Result<Layout, ReflayoutError> {
    let text = fs::read_to_string(path).map_err(|source| ReflayoutError::Template {
        path: path.to_path_buf(),
        source,
    })?;
    let layout =
        Layout::parse(&text, registry).map_err(|err| ReflayoutError::new_parse_error(err, text))?;

    for warning in layout.warnings() {
        warn!(path = path.display().to_string(); "{warning}");
    }
    Ok(layout)
}

fn load_optional(
    path: &Path,
    registry: &FormatterRegistry,
) -> Result<Option<Layout>, ReflayoutError> {
    match load_layout(path, registry) {
        Ok(layout) => Ok(Some(layout)),
        Err(ReflayoutError::Template { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
