//! core::config
//!
//! Configuration schema and loading.
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$MESHLINE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/meshline/config.toml`
//! 3. `~/.meshline/config.toml` (canonical write location)
//!
//! Missing config files are not an error; built-in defaults apply.
//!
//! # Example
//!
//! ```no_run
//! use meshline::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("data dir: {}", config.data_dir().display());
//! println!("max products: {}", config.limits().max_products);
//! ```

pub mod schema;

pub use schema::{FlushPolicy, Limits, RegistryConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw file contents (or defaults if no file was found).
    pub registry: RegistryConfig,
    /// Path to the loaded config file, if any.
    loaded_from: Option<PathBuf>,
}

impl From<RegistryConfig> for Config {
    /// Wrap raw config values without reading any file.
    fn from(registry: RegistryConfig) -> Self {
        Self {
            registry,
            loaded_from: None,
        }
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read,
    /// parsed, or validated. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let found = Self::find_config_file();
        let (registry, loaded_from) = match found {
            Some(path) => (Self::read_config(&path)?, Some(path)),
            None => (RegistryConfig::default(), None),
        };
        registry.validate()?;
        Ok(Self {
            registry,
            loaded_from,
        })
    }

    /// Load configuration from an explicit file path.
    ///
    /// Unlike [`load`](Self::load), the file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let registry = Self::read_config(path)?;
        registry.validate()?;
        Ok(Self {
            registry,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Locate the first config file in precedence order.
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("MESHLINE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("meshline/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".meshline/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn read_config(path: &Path) -> Result<RegistryConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for the config file (`~/.meshline/config.toml`).
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".meshline/config.toml"))
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Directory holding the snapshot file and store lock.
    ///
    /// Defaults to `./data` if not configured.
    pub fn data_dir(&self) -> PathBuf {
        self.registry
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    /// Capacity limits, with defaults for unset fields.
    pub fn limits(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            max_products: self.registry.max_products.unwrap_or(defaults.max_products),
            max_lineage_entries: self
                .registry
                .max_lineage_entries
                .unwrap_or(defaults.max_lineage_entries),
            max_page_size: self
                .registry
                .max_page_size
                .unwrap_or(defaults.max_page_size),
        }
    }

    /// The flush policy.
    ///
    /// Defaults to [`FlushPolicy::Immediate`] if not configured. The
    /// value was validated at load time, so parsing cannot fail here.
    pub fn flush_policy(&self) -> FlushPolicy {
        self.registry
            .flush
            .as_deref()
            .and_then(|s| FlushPolicy::parse(s).ok())
            .unwrap_or_default()
    }

    /// Path of the loaded config file, if one was found.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.data_dir(), PathBuf::from("./data"));
        assert_eq!(config.limits(), Limits::default());
        assert_eq!(config.flush_policy(), FlushPolicy::Immediate);
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_from_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            max_products = 5
            flush = "on-shutdown"
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.limits().max_products, 5);
        // Unset fields keep their defaults.
        assert_eq!(config.limits().max_page_size, 1000);
        assert_eq!(config.flush_policy(), FlushPolicy::OnShutdown);
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn load_from_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(&temp.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn invalid_values_rejected_at_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_products = 0").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "api_key = \"secret\"").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
