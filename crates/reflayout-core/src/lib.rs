//! # reflayout-core
//!
//! Shared building blocks of the reflayout template engine:
//!
//! - [`entry`] - the bibliographic entries and database that templates read.
//! - [`resolver`] - the [`FieldResolver`](resolver::FieldResolver) interface
//!   through which the interpreter reads fields.
//! - [`format`] - formatters, the formatter registry and argument decoding.

pub mod entry;
pub mod format;
pub mod resolver;

pub use entry::{Database, Entry};
pub use format::{Formatter, FormatterRegistry, ParamFormatter};
pub use resolver::{BibFieldResolver, FieldResolver};
