//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! The adapter has two configuration scopes:
//! - **Global**: user-level settings
//! - **Repo**: repository-level overrides
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//!
//! # Locations
//!
//! Global config is searched at `$SCCBRIDGE_CONFIG` if set, otherwise at
//! `<user config dir>/sccbridge/config.toml`. Repo config lives at
//! `<git dir>/sccbridge/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
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
}

/// Fallback author identity used when the repository configures none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorConfig {
    /// Author/committer name.
    pub name: String,
    /// Author/committer email.
    pub email: String,
}

/// Adapter configuration.
///
/// All fields are optional in the files; accessors apply defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote used when the host names none.
    pub remote: Option<String>,
    /// Refuse true merges during pull; fail instead of downgrading.
    pub fastforward_only: Option<bool>,
    /// Fallback commit identity.
    pub author: Option<AuthorConfig>,
}

impl Config {
    /// Load configuration with precedence applied.
    ///
    /// `git_dir` is the repository's `.git` directory, used to locate the
    /// repo-scope override. Missing files are not errors; malformed files
    /// are.
    pub fn load(git_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = global_config_path() {
            if let Some(global) = Self::read_file(&path)? {
                config.merge_from(global);
            }
        }

        if let Some(git_dir) = git_dir {
            let path = git_dir.join("sccbridge").join("config.toml");
            if let Some(repo) = Self::read_file(&path)? {
                config.merge_from(repo);
            }
        }

        Ok(config)
    }

    /// Read and parse one config file, `None` if it does not exist.
    fn read_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Some(parsed))
    }

    /// Overlay `other` onto self: set fields in `other` win.
    fn merge_from(&mut self, other: Config) {
        if other.remote.is_some() {
            self.remote = other.remote;
        }
        if other.fastforward_only.is_some() {
            self.fastforward_only = other.fastforward_only;
        }
        if other.author.is_some() {
            self.author = other.author;
        }
    }

    /// The remote to use when the host names none.
    pub fn remote(&self) -> &str {
        self.remote.as_deref().unwrap_or("origin")
    }

    /// Whether pull must refuse true merges.
    pub fn fastforward_only(&self) -> bool {
        self.fastforward_only.unwrap_or(false)
    }
}

/// Locate the global config file, honoring `$SCCBRIDGE_CONFIG`.
fn global_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SCCBRIDGE_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("sccbridge").join("config.toml"))
}
