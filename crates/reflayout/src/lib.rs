//! Reflayout - layout templates for rendering bibliographic entries.
//!
//! A layout is plain text with embedded commands: `\title` inserts a field,
//! `\format[ToUpperCase]{\author}` pipes a field through formatters, and
//! `\begin{url}...\end{url}` renders only when the field is present. Export
//! templates combine begin, entry and end layouts to render a whole
//! database.

pub mod config;
pub mod interpret;

mod error;
mod export;
mod layout;
mod session;

pub use reflayout_core::{BibFieldResolver, Database, Entry, FieldResolver, FormatterRegistry};
pub use reflayout_parser::{Diagnostic, ErrorCode, ParseError};

pub use error::{ReflayoutError, RenderError};
pub use export::ExportTemplate;
pub use layout::Layout;
pub use session::RenderSession;

use std::path::Path;

use log::{debug, info};

use config::AppConfig;

/// Builder for loading and rendering layouts with one configuration.
///
/// The builder owns the formatter registry described by its
/// [`AppConfig`], so every layout it parses sees the same formatters.
///
/// # Examples
///
/// ```rust
/// use reflayout::{Database, Entry, RenderSession, TemplateBuilder};
///
/// let builder = TemplateBuilder::default();
/// let layout = builder
///     .parse("\\author\\begin{year} (\\year)\\end{year}")
///     .expect("Failed to parse");
///
/// let entry = Entry::new("book").with_field("author", "Norbert Wiener");
/// let text = builder
///     .render_entry(&layout, &entry, &Database::new(), &mut RenderSession::new())
///     .expect("Failed to render");
/// assert_eq!(text, "Norbert Wiener");
/// ```
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    config: AppConfig,
    registry: FormatterRegistry,
}

impl TemplateBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let registry = config.registry();
        Self { config, registry }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    /// Parse a single layout and attach the configured post-formatter.
    ///
    /// # Errors
    ///
    /// Returns `ReflayoutError::Parse` for malformed template text and
    /// `ReflayoutError::Config` for an unknown post-formatter.
    pub fn parse(&self, text: &str) -> Result<Layout, ReflayoutError> {
        info!("Parsing layout");

        let mut layout = Layout::parse(text, &self.registry)
            .map_err(|err| ReflayoutError::new_parse_error(err, text))?;
        if let Some(formatter) = self.config.post_formatter(&self.registry)? {
            layout.set_post_formatter(formatter)?;
        }

        debug!(missing:? = layout.missing_formatters(); "Layout ready");
        Ok(layout)
    }

    /// Render one entry with the default field resolver.
    ///
    /// # Errors
    ///
    /// Fails if the layout contains nodes only valid in begin and end
    /// layouts.
    pub fn render_entry(
        &self,
        layout: &Layout,
        entry: &Entry,
        database: &Database,
        session: &mut RenderSession,
    ) -> Result<String, ReflayoutError> {
        Ok(layout.render_entry(entry, database, &BibFieldResolver, session)?)
    }

    /// Load the export template `name` from `dir` and attach the configured
    /// post-formatter to its entry layouts.
    ///
    /// # Errors
    ///
    /// Fails if the main layout is missing or a file cannot be read or
    /// parsed, or if the post-formatter is unknown.
    pub fn load_template(
        &self,
        dir: impl AsRef<Path>,
        name: &str,
    ) -> Result<ExportTemplate, ReflayoutError> {
        let mut template = ExportTemplate::load(dir, name, &self.registry)?;
        if let Some(post_formatter) = self.config.render().post_formatter() {
            template.set_post_formatter(post_formatter, &self.registry)?;
        }
        Ok(template)
    }

    /// Render a whole database with the configured encoding name.
    ///
    /// # Errors
    ///
    /// Fails if a layout uses a node that is invalid in its position.
    pub fn render_database(
        &self,
        template: &ExportTemplate,
        database: &Database,
    ) -> Result<String, ReflayoutError> {
        template.render(database, &BibFieldResolver, self.config.render().encoding())
    }
}
