//! Configuration types for rendering layouts.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file:
//!
//! ```toml
//! [render]
//! encoding = "UTF-8"
//! post_formatter = "HTMLChars"
//!
//! # Name formatters available to every template by name.
//! [name_formatters]
//! ShortNames = "{f.}{ vv}{ ll}"
//!
//! # Template-specific name formatters; these shadow built-in formatters.
//! [custom_name_formatters]
//! Authors = "{ll}{, f.}"
//! ```
//!
//! # Example
//!
//! ```
//! # use reflayout::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.render().encoding(), "UTF-8");
//! assert!(config.render().post_formatter().is_none());
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use reflayout_core::{Formatter, FormatterRegistry, format::BuiltinFormatters};

use crate::error::ReflayoutError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    render: RenderConfig,

    /// User name formatters, consulted after the built-in formatters.
    #[serde(default)]
    name_formatters: IndexMap<String, String>,

    /// Per-template name formatters, consulted before everything else.
    #[serde(default)]
    custom_name_formatters: IndexMap<String, String>,
}

impl AppConfig {
    pub fn new(render: RenderConfig) -> Self {
        Self {
            render,
            ..Self::default()
        }
    }

    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    pub fn name_formatters(&self) -> &IndexMap<String, String> {
        &self.name_formatters
    }

    pub fn custom_name_formatters(&self) -> &IndexMap<String, String> {
        &self.custom_name_formatters
    }

    /// Add a user name formatter.
    pub fn with_name_formatter(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.name_formatters.insert(name.into(), pattern.into());
        self
    }

    /// Add a per-template name formatter.
    pub fn with_custom_name_formatter(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        self.custom_name_formatters
            .insert(name.into(), pattern.into());
        self
    }

    /// Build the formatter registry described by this configuration.
    pub fn registry(&self) -> FormatterRegistry {
        let mut registry = FormatterRegistry::new(BuiltinFormatters::standard());
        for (name, pattern) in &self.custom_name_formatters {
            registry = registry.with_custom_name_formatter(name, pattern);
        }
        for (name, pattern) in &self.name_formatters {
            registry = registry.with_user_name_formatter(name, pattern);
        }
        registry
    }

    /// Create the configured post-formatter, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ReflayoutError::Config`] if the name does not resolve.
    pub fn post_formatter(
        &self,
        registry: &FormatterRegistry,
    ) -> Result<Option<Box<dyn Formatter>>, ReflayoutError> {
        let Some(name) = self.render.post_formatter() else {
            return Ok(None);
        };
        registry
            .create(name)
            .map(Some)
            .ok_or_else(|| ReflayoutError::Config(format!("Unknown post-formatter `{name}`")))
    }
}

/// Options of a render pass.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Name substituted for `\encoding`.
    #[serde(default = "default_encoding")]
    encoding: String,

    /// Formatter applied after every field of an entry layout.
    #[serde(default)]
    post_formatter: Option<String>,
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            post_formatter: None,
        }
    }
}

impl RenderConfig {
    pub fn new(encoding: impl Into<String>, post_formatter: Option<String>) -> Self {
        Self {
            encoding: encoding.into(),
            post_formatter,
        }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn post_formatter(&self) -> Option<&str> {
        self.post_formatter.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use reflayout_core::format::FormatterCall;

    use super::*;

    #[test]
    fn test_load_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [render]
            encoding = "ISO-8859-1"
            post_formatter = "HTMLChars"

            [name_formatters]
            Short = "{ll}"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.render().encoding(), "ISO-8859-1");
        assert_eq!(config.render().post_formatter(), Some("HTMLChars"));
        assert_eq!(config.name_formatters()["Short"], "{ll}");
        assert!(config.custom_name_formatters().is_empty());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: AppConfig = toml::from_str("").expect("valid config");
        assert_eq!(config.render().encoding(), "UTF-8");
    }

    #[test]
    fn test_registry_lookup_order() {
        let config = AppConfig::default()
            .with_custom_name_formatter("ToUpperCase", "{ll}")
            .with_name_formatter("Short", "{ll}")
            .with_name_formatter("ToLowerCase", "{ff}");
        let registry = config.registry();

        // Per-template formatters shadow built-ins; user ones do not.
        let upper = registry.resolve(&FormatterCall::new("ToUpperCase"));
        assert_eq!(upper.format("Ada Lovelace"), "Lovelace");
        let lower = registry.resolve(&FormatterCall::new("ToLowerCase"));
        assert_eq!(lower.format("Ada Lovelace"), "ada lovelace");
        let short = registry.resolve(&FormatterCall::new("Short"));
        assert_eq!(short.format("Ada Lovelace and Charles Babbage"), "Lovelace and Babbage");
    }

    #[test]
    fn test_post_formatter() {
        let registry = FormatterRegistry::default();
        let config = AppConfig::new(RenderConfig::new("UTF-8", Some("ToUpperCase".into())));
        let formatter = config
            .post_formatter(&registry)
            .expect("known formatter")
            .expect("configured");
        assert_eq!(formatter.format("abc"), "ABC");

        let config = AppConfig::new(RenderConfig::new("UTF-8", Some("Shout".into())));
        assert!(matches!(
            config.post_formatter(&registry),
            Err(ReflayoutError::Config(_))
        ));
    }
}
