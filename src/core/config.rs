//! core::config
//!
//! Per-repository configuration.
//!
//! # Location
//!
//! `.strata/config.toml`. The file is optional; every field has a
//! default and an absent file is not an error.
//!
//! # Example
//!
//! ```toml
//! default_branch = "main"
//! ```

use std::fs;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::RepoPaths;
use crate::core::types::{BranchName, TypeError};

/// Branch name used by `init` when no config overrides it.
pub const DEFAULT_BRANCH: &str = "master";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(String),

    #[error("invalid config value: {0}")]
    Value(#[from] TypeError),

    #[error("config i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Repository configuration schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch created and checked out by `init`.
    pub default_branch: Option<String>,
}

impl RepoConfig {
    /// Load the config file, or defaults if it does not exist.
    pub fn load(paths: &RepoPaths) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(paths.config_file()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The validated branch `init` should create.
    pub fn initial_branch(&self) -> Result<BranchName, ConfigError> {
        let name = self.default_branch.as_deref().unwrap_or(DEFAULT_BRANCH);
        Ok(BranchName::new(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = RepoPaths::new(dir.path().to_path_buf());
        let config = RepoConfig::load(&paths).unwrap();
        assert_eq!(config.initial_branch().unwrap().as_str(), "master");
    }

    #[test]
    fn default_branch_is_overridable() {
        let dir = TempDir::new().unwrap();
        let paths = RepoPaths::new(dir.path().to_path_buf());
        fs::create_dir_all(paths.strata_dir()).unwrap();
        fs::write(paths.config_file(), "default_branch = \"main\"\n").unwrap();
        let config = RepoConfig::load(&paths).unwrap();
        assert_eq!(config.initial_branch().unwrap().as_str(), "main");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let paths = RepoPaths::new(dir.path().to_path_buf());
        fs::create_dir_all(paths.strata_dir()).unwrap();
        fs::write(paths.config_file(), "no_such_key = 1\n").unwrap();
        assert!(matches!(
            RepoConfig::load(&paths),
            Err(ConfigError::Parse(_))
        ));
    }
}
