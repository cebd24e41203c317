//! Evaluation of layout trees.
//!
//! Entry layouts are rendered with [`render_entry`]; begin and end layouts,
//! which see the database but no entry, with [`render_database_level`].

use std::path::{self, Path};

use log::trace;

use reflayout_core::{Database, Entry, FieldResolver, Formatter};
use reflayout_parser::{BlockKind, LayoutNode};

use crate::{error::RenderError, session::RenderSession};

/// What an entry layout is rendered against.
#[derive(Clone, Copy)]
pub struct EntryContext<'a> {
    pub entry: &'a Entry,
    pub database: &'a Database,
    pub resolver: &'a dyn FieldResolver,
    /// Applied last to every field reference and option field.
    pub post_formatter: Option<&'a dyn Formatter>,
}

impl<'a> EntryContext<'a> {
    pub fn new(entry: &'a Entry, database: &'a Database, resolver: &'a dyn FieldResolver) -> Self {
        Self {
            entry,
            database,
            resolver,
            post_formatter: None,
        }
    }

    pub fn with_post_formatter(mut self, formatter: Option<&'a dyn Formatter>) -> Self {
        self.post_formatter = formatter;
        self
    }

    /// A resolved, non-empty field value.
    fn field(&self, name: &str) -> Option<String> {
        self.resolver
            .resolve(name, self.entry, self.database)
            .filter(|value| !value.is_empty())
    }

    fn post_format(&self, value: String) -> String {
        match self.post_formatter {
            Some(formatter) => formatter.format(&value),
            None => value,
        }
    }
}

/// What a begin or end layout is rendered against.
#[derive(Clone, Copy)]
pub struct DatabaseContext<'a> {
    pub database: &'a Database,
    pub resolver: &'a dyn FieldResolver,
    /// Name substituted for `\encoding`.
    pub encoding: &'a str,
    pub post_formatter: Option<&'a dyn Formatter>,
}

impl<'a> DatabaseContext<'a> {
    pub fn new(database: &'a Database, resolver: &'a dyn FieldResolver, encoding: &'a str) -> Self {
        Self {
            database,
            resolver,
            encoding,
            post_formatter: None,
        }
    }

    pub fn with_post_formatter(mut self, formatter: Option<&'a dyn Formatter>) -> Self {
        self.post_formatter = formatter;
        self
    }
}

/// Render an entry layout.
///
/// Blocks whose test fails contribute nothing. The session's group marker
/// is read and updated by group blocks.
///
/// # Errors
///
/// Returns [`RenderError::DatabaseMarkerInEntry`] if the layout contains
/// `\encoding`, `\filename` or `\filepath`.
pub fn render_entry(
    nodes: &[LayoutNode],
    ctx: &EntryContext<'_>,
    session: &mut RenderSession,
) -> Result<String, RenderError> {
    let mut output = String::new();
    for node in nodes {
        if let Some(text) = evaluate(node, ctx, session)? {
            output.push_str(&text);
        }
    }
    Ok(output)
}

/// Evaluate one node. `None` means a block whose test did not hold.
fn evaluate(
    node: &LayoutNode,
    ctx: &EntryContext<'_>,
    session: &mut RenderSession,
) -> Result<Option<String>, RenderError> {
    let text = match node {
        LayoutNode::Text(text) => text.clone(),
        LayoutNode::FieldRef(name) => ctx.post_format(ctx.field(name).unwrap_or_default()),
        LayoutNode::OptionField { field, chain } => {
            let value = match field.strip_prefix('\\') {
                Some(name) => ctx.field(name).unwrap_or_default(),
                None => ctx.resolver.database_level_text(field, ctx.database),
            };
            ctx.post_format(chain.apply(value))
        }
        LayoutNode::Block {
            kind: BlockKind::Field,
            test,
            children,
        } => {
            if !field_test(test, ctx) {
                trace!(test = test.as_str(); "Block test failed");
                return Ok(None);
            }
            render_children(children, ctx, session)?
        }
        LayoutNode::Block {
            kind: BlockKind::Group,
            test,
            children,
        } => {
            let Some(value) = ctx.field(test.trim()) else {
                return Ok(None);
            };
            if session.repeats_group(&value) {
                trace!(group = value.as_str(); "Group repeated, skipping");
                return Ok(None);
            }
            session.enter_group(value);
            render_children(children, ctx, session)?
        }
        LayoutNode::EncodingMarker => return Err(marker_error("\\encoding")),
        LayoutNode::FilenameMarker => return Err(marker_error("\\filename")),
        LayoutNode::FilepathMarker => return Err(marker_error("\\filepath")),
    };
    Ok(Some(text))
}

fn marker_error(marker: &'static str) -> RenderError {
    RenderError::DatabaseMarkerInEntry { marker }
}

/// Render the children of a block.
///
/// A child that renders nothing, followed by a sibling that renders only
/// whitespace, drops that sibling too. The next contribution then loses its
/// leading line breaks.
fn render_children(
    children: &[LayoutNode],
    ctx: &EntryContext<'_>,
    session: &mut RenderSession,
) -> Result<String, RenderError> {
    let mut output = String::new();
    let mut previous_skipped = false;
    let mut lookahead: Option<Option<String>> = None;
    let mut index = 0;

    while index < children.len() {
        let value = match lookahead.take() {
            Some(value) => value,
            None => evaluate(&children[index], ctx, session)?,
        };

        match value {
            None => {
                if let Some(next) = children.get(index + 1) {
                    let next = evaluate(next, ctx, session)?;
                    if next.as_deref().is_none_or(|text| text.trim().is_empty()) {
                        index += 2;
                        previous_skipped = true;
                        continue;
                    }
                    lookahead = Some(next);
                }
            }
            Some(text) if previous_skipped => {
                output.push_str(text.trim_start_matches(['\n', '\r']));
            }
            Some(text) => output.push_str(&text),
        }

        previous_skipped = false;
        index += 1;
    }

    Ok(output)
}

/// Evaluate a field block test.
///
/// Parts separated by `;`, `&` or `&&` must all hold; otherwise parts
/// separated by `|` or `||` are alternatives. A part holds when its field is
/// present, or absent if the part is negated with `!`.
fn field_test(test: &str, ctx: &EntryContext<'_>) -> bool {
    let holds = |part: &str| match part.strip_prefix('!') {
        Some(name) => ctx.field(name.trim()).is_none(),
        None => ctx.field(part).is_some(),
    };

    if test.contains([';', '&']) {
        let parts = test_parts(test, &[';', '&']);
        !parts.is_empty() && parts.into_iter().all(holds)
    } else {
        test_parts(test, &['|']).into_iter().any(holds)
    }
}

fn test_parts<'t>(test: &'t str, separators: &[char]) -> Vec<&'t str> {
    test.split(separators)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Render a begin or end layout.
///
/// # Errors
///
/// Returns [`RenderError::EntryContentAtDatabaseLevel`] if the layout
/// contains a field reference or a block.
pub fn render_database_level(
    nodes: &[LayoutNode],
    ctx: &DatabaseContext<'_>,
) -> Result<String, RenderError> {
    let mut output = String::new();
    for node in nodes {
        match node {
            LayoutNode::Text(text) => output.push_str(text),
            LayoutNode::OptionField { field, chain } => {
                let value = chain.apply(ctx.resolver.database_level_text(field, ctx.database));
                match ctx.post_formatter {
                    Some(formatter) => output.push_str(&formatter.format(&value)),
                    None => output.push_str(&value),
                }
            }
            LayoutNode::EncodingMarker => output.push_str(ctx.encoding),
            LayoutNode::FilenameMarker => {
                if let Some(name) = ctx.database.path().and_then(Path::file_name) {
                    output.push_str(&name.to_string_lossy());
                }
            }
            LayoutNode::FilepathMarker => {
                if let Some(db_path) = ctx.database.path() {
                    let absolute =
                        path::absolute(db_path).unwrap_or_else(|_| db_path.to_path_buf());
                    output.push_str(&absolute.to_string_lossy());
                }
            }
            LayoutNode::FieldRef(name) => {
                return Err(RenderError::EntryContentAtDatabaseLevel {
                    what: format!("field `\\{name}`"),
                });
            }
            LayoutNode::Block { kind, test, .. } => {
                return Err(RenderError::EntryContentAtDatabaseLevel {
                    what: format!("block `\\{kind}{{{test}}}`"),
                });
            }
        }
    }
    Ok(output)
}
