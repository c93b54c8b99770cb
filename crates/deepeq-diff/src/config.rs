//! Session settings loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::style::Style;

/// Serializable session settings, typically loaded from a TOML file:
///
/// ```toml
/// verbose = true
/// exclude = ["InnerStruct::Name"]
/// style = "ansi"
/// sort_map_keys = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Render passing nodes as well as the failing path.
    pub verbose: bool,
    /// Fields to skip, as `Type::field`.
    pub exclude: Vec<String>,
    /// Report palette.
    pub style: Style,
    /// Compare and render mapping entries in key order.
    pub sort_map_keys: bool,
}

impl SessionConfig {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
