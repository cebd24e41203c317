//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use reflayout::{ReflayoutError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for ReflayoutError {
    fn from(err: ConfigError) -> Self {
        ReflayoutError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (reflayout/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or validated
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, ReflayoutError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("reflayout/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "reflayout", "reflayout") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, ReflayoutError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;

    Ok(config)
}

/// Reject name-formatter tables with empty names or patterns.
fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let tables = [
        ("name_formatters", config.name_formatters()),
        ("custom_name_formatters", config.custom_name_formatters()),
    ];
    for (table, formatters) in tables {
        for (name, pattern) in formatters {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "empty formatter name in [{table}]"
                )));
            }
            if pattern.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "formatter `{name}` in [{table}] has an empty pattern"
                )));
            }
        }
    }
    if config.render().encoding().trim().is_empty() {
        return Err(ConfigError::Validation("empty encoding name".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_explicit_path() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[render]\nencoding = \"ISO-8859-1\"\n").expect("write config");

        let config = load_config(Some(&path)).expect("valid config");
        assert_eq!(config.render().encoding(), "ISO-8859-1");
    }

    #[test]
    fn test_missing_explicit_path() {
        let dir = tempdir().expect("temp dir");
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ReflayoutError::Config(msg) if msg.contains("Missing")));
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[name_formatters]\nShort = \"  \"\n").expect("write config");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ReflayoutError::Config(msg) if msg.contains("Short")));
    }
}
