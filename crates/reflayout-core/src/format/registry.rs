//! Resolution of formatter names.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::format::{
    BuiltinFormatters, Formatter, FormatterCall, NameFormatter, NotFoundFormatter,
};

/// Resolves formatter names to formatter instances.
///
/// Lookup order for a name:
///
/// 1. the per-template custom name-formatter table,
/// 2. the built-in formatter table,
/// 3. the user-defined name-formatter table,
/// 4. a [`NotFoundFormatter`] placeholder, flagged as missing.
///
/// Entries of both name-formatter tables map a name to a
/// [`NameFormatter`] pattern.
pub struct FormatterRegistry {
    builtins: BuiltinFormatters,
    custom_name_formatters: IndexMap<String, String>,
    user_name_formatters: IndexMap<String, String>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new(BuiltinFormatters::standard())
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("builtins", &self.builtins)
            .field("custom_name_formatters", &self.custom_name_formatters)
            .field("user_name_formatters", &self.user_name_formatters)
            .finish()
    }
}

impl FormatterRegistry {
    /// Create a registry over the given built-in table, with empty
    /// name-formatter tables.
    pub fn new(builtins: BuiltinFormatters) -> Self {
        Self {
            builtins,
            custom_name_formatters: IndexMap::new(),
            user_name_formatters: IndexMap::new(),
        }
    }

    /// Add a name formatter defined by the export template being loaded.
    pub fn with_custom_name_formatter(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        self.custom_name_formatters.insert(name.into(), pattern.into());
        self
    }

    /// Add a name formatter from user preferences.
    pub fn with_user_name_formatter(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        self.user_name_formatters.insert(name.into(), pattern.into());
        self
    }

    pub fn builtins(&self) -> &BuiltinFormatters {
        &self.builtins
    }

    /// Resolve one call. Never fails: unknown names resolve to a passthrough
    /// handle for which [`FormatterHandle::is_missing`] is `true`.
    pub fn resolve(&self, call: &FormatterCall) -> FormatterHandle {
        let name = call.name().trim();

        if let Some(pattern) = self.custom_name_formatters.get(name) {
            trace!(name, pattern = pattern.as_str(); "Resolved custom name formatter");
            return FormatterHandle::found(call, Box::new(NameFormatter::with_pattern(pattern)));
        }

        if let Some(mut formatter) = self.builtins.create(name) {
            if let (Some(param), Some(argument)) = (formatter.as_param_mut(), call.argument()) {
                param.set_argument(argument);
            }
            return FormatterHandle::found(call, formatter);
        }

        if let Some(pattern) = self.user_name_formatters.get(name) {
            trace!(name, pattern = pattern.as_str(); "Resolved user name formatter");
            return FormatterHandle::found(call, Box::new(NameFormatter::with_pattern(pattern)));
        }

        debug!(name; "Formatter not found");
        FormatterHandle {
            name: name.to_string(),
            argument: call.argument().map(str::to_string),
            formatter: Box::new(NotFoundFormatter::new(name)),
            missing: true,
        }
    }

    /// Resolve a sequence of calls into a chain.
    ///
    /// Returns the chain and the names that could not be resolved, in order
    /// of appearance.
    pub fn build_chain(&self, calls: &[FormatterCall]) -> (FormatterChain, Vec<String>) {
        let mut links = Vec::with_capacity(calls.len());
        let mut missing = Vec::new();
        for call in calls {
            let handle = self.resolve(call);
            if handle.is_missing() {
                missing.push(handle.name().to_string());
            }
            links.push(handle);
        }
        (FormatterChain { links }, missing)
    }

    /// Create a formatter by name without an argument, e.g. for use as a
    /// post-formatter. Returns `None` for unknown names.
    pub fn create(&self, name: &str) -> Option<Box<dyn Formatter>> {
        let handle = self.resolve(&FormatterCall::new(name));
        (!handle.is_missing()).then_some(handle.formatter)
    }
}

/// A resolved formatter, remembering the call it was resolved from.
pub struct FormatterHandle {
    name: String,
    argument: Option<String>,
    formatter: Box<dyn Formatter>,
    missing: bool,
}

impl FormatterHandle {
    fn found(call: &FormatterCall, formatter: Box<dyn Formatter>) -> Self {
        Self {
            name: call.name().trim().to_string(),
            argument: call.argument().map(str::to_string),
            formatter,
            missing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// `true` if the name did not resolve and this handle is a passthrough.
    pub fn is_missing(&self) -> bool {
        self.missing
    }

    pub fn format(&self, input: &str) -> String {
        self.formatter.format(input)
    }
}

impl fmt::Debug for FormatterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterHandle")
            .field("name", &self.name)
            .field("argument", &self.argument)
            .field("missing", &self.missing)
            .finish()
    }
}

/// Formatters applied in order, each to the output of the previous one.
#[derive(Debug, Default)]
pub struct FormatterChain {
    links: Vec<FormatterHandle>,
}

impl FormatterChain {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn apply(&self, input: String) -> String {
        self.links
            .iter()
            .fold(input, |value, link| link.format(&value))
    }

    pub fn links(&self) -> &[FormatterHandle] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
