//! reflayout CLI library
//!
//! This module contains the core CLI logic: load the configuration, the
//! entries file and an export template, then render the entries.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

use log::{info, warn};

use reflayout::{Database, ReflayoutError, TemplateBuilder};

/// Run the reflayout CLI application
///
/// Renders every entry of the input file through the export template
/// `args.name` found in `args.layout_dir`, and writes the result to the
/// output file or standard output.
///
/// # Errors
///
/// Returns `ReflayoutError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed entries files
/// - Template parsing errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), ReflayoutError> {
    info!(
        input_path = args.input,
        layout_dir = args.layout_dir,
        template = args.name;
        "Rendering entries"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let database = load_database(&args.input)?;

    let builder = TemplateBuilder::new(app_config);
    let template = builder.load_template(&args.layout_dir, &args.name)?;
    for name in template.missing_formatters() {
        warn!(formatter = name.as_str(); "Formatter not found, its input is copied unchanged");
    }

    let output = builder.render_database(&template, &database)?;

    match &args.output {
        Some(path) => {
            fs::write(path, output)?;
            info!(output_file = path.as_str(); "Output written");
        }
        None => io::stdout().write_all(output.as_bytes())?,
    }

    Ok(())
}

/// Read an entries file. A file without a `path` key stands for itself in
/// `\filename` and `\filepath`.
fn load_database(path: impl AsRef<Path>) -> Result<Database, ReflayoutError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let database: Database =
        toml::from_str(&content).map_err(|e| ReflayoutError::Entries(e.to_string()))?;

    info!(entries = database.entries().len(); "Entries loaded");
    if database.path().is_some() {
        Ok(database)
    } else {
        Ok(database.with_path(path))
    }
}
