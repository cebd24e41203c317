use std::fmt;

use log::{debug, info};

use reflayout_core::{Database, Entry, FieldResolver, Formatter, FormatterRegistry};
use reflayout_parser::{Diagnostic, LayoutNode, ParseError};

use crate::{
    error::{ReflayoutError, RenderError},
    interpret::{self, DatabaseContext, EntryContext},
    session::RenderSession,
};

/// A parsed template, ready to be rendered any number of times.
///
/// # Example
///
/// ```
/// use reflayout::{Layout, RenderSession};
/// use reflayout_core::{BibFieldResolver, Database, Entry, FormatterRegistry};
///
/// let layout = Layout::parse(
///     "\\format[RemoveBrackets]{\\title}\\begin{year} (\\year)\\end{year}",
///     &FormatterRegistry::default(),
/// )
/// .unwrap();
///
/// let entry = Entry::new("article").with_field("title", "{A} and {B}");
/// let text = layout
///     .render_entry(&entry, &Database::new(), &BibFieldResolver, &mut RenderSession::new())
///     .unwrap();
/// assert_eq!(text, "A and B");
/// ```
pub struct Layout {
    nodes: Vec<LayoutNode>,
    missing_formatters: Vec<String>,
    warnings: Vec<Diagnostic>,
    post_formatter: Option<Box<dyn Formatter>>,
}

impl Layout {
    /// Parse template text, resolving formatter names through `registry`.
    ///
    /// # Errors
    ///
    /// Fails only on an empty command name (`\` not followed by a name).
    /// Other problems are recovered from and listed in
    /// [`warnings`](Self::warnings).
    pub fn parse(text: &str, registry: &FormatterRegistry) -> Result<Self, ParseError> {
        let forest = reflayout_parser::parse(text, registry)?;

        if !forest.missing_formatters.is_empty() {
            info!(missing:? = forest.missing_formatters; "Layout uses unknown formatters");
        }
        debug!(
            nodes = forest.nodes.len(),
            warnings = forest.warnings.len();
            "Layout parsed"
        );

        Ok(Self {
            nodes: forest.nodes,
            missing_formatters: forest.missing_formatters,
            warnings: forest.warnings,
            post_formatter: None,
        })
    }

    /// Render one entry.
    ///
    /// # Errors
    ///
    /// Fails if the layout uses `\encoding`, `\filename` or `\filepath`.
    pub fn render_entry(
        &self,
        entry: &Entry,
        database: &Database,
        resolver: &dyn FieldResolver,
        session: &mut RenderSession,
    ) -> Result<String, RenderError> {
        let ctx = EntryContext::new(entry, database, resolver)
            .with_post_formatter(self.post_formatter.as_deref());
        interpret::render_entry(&self.nodes, &ctx, session)
    }

    /// Render as a begin or end layout, without an entry.
    ///
    /// # Errors
    ///
    /// Fails if the layout references entry fields or contains blocks.
    pub fn render_database_level(
        &self,
        database: &Database,
        resolver: &dyn FieldResolver,
        encoding: &str,
    ) -> Result<String, RenderError> {
        let ctx = DatabaseContext::new(database, resolver, encoding)
            .with_post_formatter(self.post_formatter.as_deref());
        interpret::render_database_level(&self.nodes, &ctx)
    }

    /// Formatter names that did not resolve, each listed once.
    pub fn missing_formatters(&self) -> &[String] {
        &self.missing_formatters
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    /// Attach a formatter applied after every field's own formatters.
    ///
    /// # Errors
    ///
    /// A layout takes at most one post-formatter; a second call fails.
    pub fn set_post_formatter(&mut self, formatter: Box<dyn Formatter>) -> Result<(), ReflayoutError> {
        if self.post_formatter.is_some() {
            return Err(ReflayoutError::PostFormatterAlreadySet);
        }
        self.post_formatter = Some(formatter);
        Ok(())
    }

    pub fn has_post_formatter(&self) -> bool {
        self.post_formatter.is_some()
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("nodes", &self.nodes)
            .field("missing_formatters", &self.missing_formatters)
            .field("warnings", &self.warnings.len())
            .field("post_formatter", &self.post_formatter.is_some())
            .finish()
    }
}
