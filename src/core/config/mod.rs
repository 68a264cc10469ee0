//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! ghup has two configuration files:
//! - **Global**: User-level defaults
//! - **Repo**: `.ghup.toml` at the working-tree root, overriding the global file
//!
//! Files are only one layer of resolution. The CLI resolves each value in
//! this order (earlier wins):
//! 1. CLI flags
//! 2. Environment variables (see [`env`])
//! 3. Repo config file, then global config file
//! 4. GitHub Actions context (see [`env::ActionsContext`])
//! 5. Local repository defaults (see [`crate::git`])
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `--config` if given
//! 2. `$GHUP_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/ghup/config.toml`
//! 4. `<platform config dir>/ghup/config.toml`
//! 5. `~/.ghup/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use ghup::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(None, Some(Path::new("/path/to/repo"))).unwrap();
//! if let Some(owner) = result.config.owner() {
//!     println!("owner: {}", owner);
//! }
//! ```

pub mod env;
pub mod schema;
pub mod token;

pub use schema::{CommitDefaults, FileConfig, PullRequestDefaults};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the repository-level config.
pub const REPO_CONFIG_FILE: &str = ".ghup.toml";

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

    #[error("config file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("no GitHub token found")]
    NoToken,

    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from the global and repo files.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Repo values layered over global values
    merged: FileConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// `explicit` is the `--config` path. If `repo_root` is provided, the
    /// repository's `.ghup.toml` is layered on top.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file is missing, or if any
    /// config file exists but cannot be parsed or fails validation.
    pub fn load(
        explicit: Option<&Path>,
        repo_root: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with(explicit, repo_root, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with environment lookups routed through `lookup`.
    pub fn load_with(
        explicit: Option<&Path>,
        repo_root: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                (Self::read_config(path)?, Some(path.to_path_buf()))
            }
            None => match Self::find_global(&lookup) {
                Some(path) => (Self::read_config(&path)?, Some(path)),
                None => (FileConfig::default(), None),
            },
        };

        let (repo, repo_path) = match repo_root.map(|r| r.join(REPO_CONFIG_FILE)) {
            Some(path) if path.exists() => (Some(Self::read_config(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        let merged = match repo {
            Some(r) => global.merge(r),
            None => global,
        };

        Ok(ConfigLoadResult {
            config: Config {
                merged,
                global_path,
                repo_path,
            },
        })
    }

    /// First existing global config file.
    fn find_global(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(path) = lookup("GHUP_CONFIG").filter(|p| !p.is_empty()) {
            candidates.push(PathBuf::from(path));
        }
        if let Some(xdg_home) = lookup("XDG_CONFIG_HOME").filter(|p| !p.is_empty()) {
            candidates.push(PathBuf::from(xdg_home).join("ghup/config.toml"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("ghup/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".ghup/config.toml"));
        }

        candidates.into_iter().find(|p| p.exists())
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Build a config from an in-memory file (used by tests and callers
    /// that already hold a parsed file).
    pub fn from_file(file: FileConfig) -> Self {
        Config {
            merged: file,
            ..Default::default()
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn owner(&self) -> Option<&str> {
        self.merged.owner.as_deref()
    }

    pub fn repo(&self) -> Option<&str> {
        self.merged.repo.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.merged.branch.as_deref()
    }

    /// Token value or token file path.
    pub fn token(&self) -> Option<&str> {
        self.merged.token.as_deref()
    }

    /// REST API base URL override.
    pub fn api_url(&self) -> Option<&str> {
        self.merged.api_url.as_deref()
    }

    pub fn output(&self) -> Option<&str> {
        self.merged.output.as_deref()
    }

    /// Defaults to `false` if not configured.
    pub fn compact(&self) -> bool {
        self.merged.compact.unwrap_or(false)
    }

    /// Commit defaults (empty if not configured).
    pub fn commit(&self) -> CommitDefaults {
        self.merged.commit.clone().unwrap_or_default()
    }

    /// Pull request defaults (empty if not configured).
    pub fn pull_request(&self) -> PullRequestDefaults {
        self.merged.pull_request.clone().unwrap_or_default()
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
