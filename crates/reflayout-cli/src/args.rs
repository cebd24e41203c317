//! Command-line argument definitions for the reflayout CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the entries file, the export template,
//! the output destination, the configuration file and logging verbosity.

use clap::Parser;

/// Command-line arguments for the reflayout renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the entries file (TOML)
    #[arg(help = "Path to the entries file")]
    pub input: String,

    /// Directory holding the template's `.layout` files
    #[arg(short, long, default_value = ".")]
    pub layout_dir: String,

    /// Template name, e.g. `html` for `html.layout`
    #[arg(short, long)]
    pub name: String,

    /// Output file; standard output when absent
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
