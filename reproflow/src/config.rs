//! Persisted repository configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default pipeline definition file, used as the target when none is given.
pub const PROJECT_FILE: &str = "dvc.yaml";

/// Repository-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// The `core` section.
    #[serde(default)]
    pub core: CoreConfig,
}

/// The `core` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Ask for confirmation before executing each stage.
    #[serde(default)]
    pub interactive: bool,
    /// Pipeline definition file used as the default target.
    #[serde(default = "default_project_file")]
    pub project_file: String,
}

fn default_project_file() -> String {
    PROJECT_FILE.to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            interactive: false,
            project_file: default_project_file(),
        }
    }
}

impl RepoConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the persisted interactive default.
    #[must_use]
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.core.interactive = interactive;
        self
    }

    /// Parses a configuration from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
