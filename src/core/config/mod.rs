//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. An explicit path (`--config`), which must exist
//! 2. `$REPOSYNC_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/reposync/config.toml`
//! 4. `~/.reposync/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use reposync::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("workers: {}", config.processes());
//! println!("default branch: {}", config.default_branch());
//! ```

pub mod schema;

pub use schema::{CheckoutConfig, FileConfig, ScmConfig};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Worker count when none is configured.
pub const DEFAULT_PROCESSES: usize = 10;

/// Upstream branch fetched, and checked out when a reference is not pinned.
pub const DEFAULT_BRANCH: &str = "master";

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

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("environment variable '{var}' for scm host '{host}' is not set")]
    MissingSecret { host: String, var: String },
}

/// Credentials for one hosting service, resolved for a run.
#[derive(Clone, PartialEq, Eq)]
pub struct HostCredentials {
    /// Account that owns the forks
    pub user: String,
    /// Password or token for basic auth
    pub password: String,
    /// API base URL without a trailing slash
    pub api_base_url: String,
}

impl std::fmt::Debug for HostCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCredentials")
            .field("user", &self.user)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

/// Loaded configuration with accessors that apply defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (defaults if no file was found)
    pub file: FileConfig,
    /// Path the file was loaded from
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// If `explicit` is given it must exist. Otherwise the standard
    /// locations are searched and a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            None => Self::discover(),
        };

        match path {
            Some(path) => {
                let file = Self::read(&path)?;
                Ok(Self {
                    file,
                    path: Some(path),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Build a config from already-parsed contents.
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self { file, path: None })
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("REPOSYNC_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("reposync/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".reposync/config.toml"))
            .filter(|path| path.exists())
    }

    fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        file.validate()?;
        Ok(file)
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Repository references listed in the file.
    pub fn repos(&self) -> &[String] {
        &self.file.repos
    }

    /// Worker count. Defaults to [`DEFAULT_PROCESSES`].
    pub fn processes(&self) -> usize {
        self.file.processes.unwrap_or(DEFAULT_PROCESSES)
    }

    /// Default branch. Defaults to [`DEFAULT_BRANCH`].
    pub fn default_branch(&self) -> &str {
        self.file
            .default_branch
            .as_deref()
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// Checkout base directory, if configured.
    pub fn install_dir(&self) -> Option<&Path> {
        self.file
            .checkout
            .as_ref()
            .and_then(|c| c.install_dir.as_deref())
    }

    /// Whether pinned revisions are honored. Defaults to `true`.
    pub fn ensure_pinned(&self) -> bool {
        self.file
            .checkout
            .as_ref()
            .and_then(|c| c.ensure_pinned)
            .unwrap_or(true)
    }

    /// Resolve credentials for every configured host.
    ///
    /// Passwords given through `password_env` are read from the environment
    /// here, once per run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSecret` if a referenced variable is unset.
    pub fn credentials(&self) -> Result<BTreeMap<String, HostCredentials>, ConfigError> {
        let mut resolved = BTreeMap::new();
        for (host, scm) in &self.file.scm {
            let password = match (&scm.password, &scm.password_env) {
                (Some(password), _) => password.clone(),
                (None, Some(var)) => {
                    std::env::var(var).map_err(|_| ConfigError::MissingSecret {
                        host: host.clone(),
                        var: var.clone(),
                    })?
                }
                (None, None) => {
                    return Err(ConfigError::InvalidValue(format!(
                        "scm.\"{}\": one of password or password_env is required",
                        host
                    )))
                }
            };

            resolved.insert(
                host.clone(),
                HostCredentials {
                    user: scm.user.clone(),
                    password,
                    api_base_url: scm.api.trim_end_matches('/').to_string(),
                },
            );
        }
        Ok(resolved)
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
