//! Tool configuration (permisos.toml)
//!
//! Every field has a default, so an empty file (or no file) is valid.

use crate::hierarchy::{default_families, ComponentKind, FamilyRule};
use crate::names::{ClassName, DEFAULT_PREFIX};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file looked up by the CLI
pub const CONFIG_FILE: &str = "permisos.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Qualified name of the marker annotation
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Qualified name of the method-level permission annotation
    #[serde(default = "default_required_permissions")]
    pub required_permissions: String,

    /// Prefix of generated type names
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Copy classes that were not rewritten to the output directory
    #[serde(default)]
    pub copy_non_transformed: bool,

    /// Worker threads for the transformer (0 = number of CPUs)
    #[serde(default)]
    pub workers: usize,

    /// Family table, in match order
    #[serde(default = "default_families")]
    pub families: Vec<FamilyRule>,
}

fn default_marker() -> String {
    "cn.nikeo.permisos.weaving.Permisos".to_string()
}

fn default_required_permissions() -> String {
    "cn.nikeo.permisos.weaving.RequiredPermissions".to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            required_permissions: default_required_permissions(),
            prefix: default_prefix(),
            copy_non_transformed: false,
            workers: 0,
            families: default_families(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `permisos.toml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("marker", &self.marker),
            ("required_permissions", &self.required_permissions),
            ("prefix", &self.prefix),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "'{}' cannot be empty",
                    field
                )));
            }
        }

        if self.families.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one family is required".to_string(),
            ));
        }

        let mut kinds: FxHashSet<ComponentKind> = FxHashSet::default();
        for family in &self.families {
            if family.root.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "family '{}' has an empty root",
                    family.kind
                )));
            }
            if matches!(&family.required_subtype, Some(s) if s.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "family '{}' has an empty required_subtype",
                    family.kind
                )));
            }
            if !kinds.insert(family.kind) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate family kind '{}'",
                    family.kind
                )));
            }
        }

        Ok(())
    }

    /// Simple name of the marker annotation (`Permisos`)
    pub fn marker_simple_name(&self) -> String {
        ClassName::parse_qualified(&self.marker)
            .simple_name()
            .to_string()
    }

    /// Field descriptor of the marker annotation (`Lcn/nikeo/permisos/weaving/Permisos;`)
    pub fn marker_descriptor(&self) -> String {
        ClassName::parse_qualified(&self.marker).descriptor()
    }

    /// Simple name of the method-level annotation (`RequiredPermissions`)
    pub fn required_permissions_simple_name(&self) -> String {
        ClassName::parse_qualified(&self.required_permissions)
            .simple_name()
            .to_string()
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}
