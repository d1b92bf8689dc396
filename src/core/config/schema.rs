//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: capacity limits must be
//! non-zero and the flush policy must be one of the known names.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Registry configuration file contents.
///
/// Every field is optional; unset fields fall back to built-in defaults
/// (see the accessors on [`super::Config`]).
///
/// # Example
///
/// ```toml
/// data_dir = "/var/lib/meshline"
/// max_products = 1000
/// max_lineage_entries = 10000
/// max_page_size = 1000
/// flush = "immediate"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Directory holding the snapshot file and store lock.
    pub data_dir: Option<PathBuf>,

    /// Maximum number of registered products.
    pub max_products: Option<usize>,

    /// Maximum number of lineage edges.
    pub max_lineage_entries: Option<usize>,

    /// Maximum page size for list/query operations.
    pub max_page_size: Option<usize>,

    /// When to persist after a mutation ("immediate" or "on-shutdown").
    pub flush: Option<String>,
}

impl RegistryConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_products", self.max_products),
            ("max_lineage_entries", self.max_lineage_entries),
            ("max_page_size", self.max_page_size),
        ] {
            if value == Some(0) {
                return Err(ConfigError::InvalidValue(format!(
                    "{field} must be greater than zero"
                )));
            }
        }

        if let Some(flush) = &self.flush {
            FlushPolicy::parse(flush)?;
        }

        Ok(())
    }
}

/// Capacity limits enforced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of registered products.
    pub max_products: usize,
    /// Maximum number of lineage edges.
    pub max_lineage_entries: usize,
    /// Maximum page size for list/query operations.
    pub max_page_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_products: 1000,
            max_lineage_entries: 10_000,
            max_page_size: 1000,
        }
    }
}

/// When the engine persists after a mutation.
///
/// This only controls the engine's own behavior; a supervisor can always
/// drive additional flushes through the engine's flush primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Persist after every accepted mutation.
    #[default]
    Immediate,
    /// Persist only on explicit flush and on clean shutdown.
    OnShutdown,
}

impl FlushPolicy {
    /// Valid policy names as written in the config file.
    pub const VALID_POLICIES: &'static [&'static str] = &["immediate", "on-shutdown"];

    /// Parse a policy name from its config-file form.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "immediate" => Ok(Self::Immediate),
            "on-shutdown" => Ok(Self::OnShutdown),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid flush policy '{}', must be one of: {}",
                other,
                Self::VALID_POLICIES.join(", ")
            ))),
        }
    }
}
