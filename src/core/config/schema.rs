//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: the worker count must be
//! positive, every `[scm]` entry needs a user, a password source and an
//! http(s) API base URL.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// repos = ["https://github.com/rust-lang/log.git@0.4.22"]
/// processes = 10
/// default_branch = "master"
///
/// [scm."github.com"]
/// user = "mirror-bot"
/// password_env = "REPOSYNC_GITHUB_TOKEN"
/// api = "https://api.github.com"
///
/// [checkout]
/// install_dir = "/srv/src"
/// ensure_pinned = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Repository references to reconcile
    pub repos: Vec<String>,

    /// Concurrent worker count
    pub processes: Option<usize>,

    /// Branch fetched from upstream and used when a reference is not pinned
    pub default_branch: Option<String>,

    /// Hosting credentials keyed by host name
    pub scm: BTreeMap<String, ScmConfig>,

    /// Local checkout settings
    pub checkout: Option<CheckoutConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processes == Some(0) {
            return Err(ConfigError::InvalidValue(
                "processes must be at least 1".into(),
            ));
        }

        if let Some(branch) = &self.default_branch {
            if branch.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_branch cannot be empty".into(),
                ));
            }
        }

        for (host, scm) in &self.scm {
            scm.validate(host)?;
        }

        Ok(())
    }
}

/// Credentials and API location for one hosting service.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScmConfig {
    /// Account that owns the forks
    pub user: String,

    /// Inline password or token
    pub password: Option<String>,

    /// Environment variable holding the password or token
    pub password_env: Option<String>,

    /// API base URL (e.g. `https://api.github.com`)
    pub api: String,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for ScmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScmConfig")
            .field("user", &self.user)
            .field("has_password", &self.password.is_some())
            .field("password_env", &self.password_env)
            .field("api", &self.api)
            .finish()
    }
}

impl ScmConfig {
    fn validate(&self, host: &str) -> Result<(), ConfigError> {
        if self.user.trim().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "scm.\"{}\": user cannot be empty",
                host
            )));
        }

        match (&self.password, &self.password_env) {
            (None, None) => {
                return Err(ConfigError::InvalidValue(format!(
                    "scm.\"{}\": one of password or password_env is required",
                    host
                )))
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidValue(format!(
                    "scm.\"{}\": password and password_env are mutually exclusive",
                    host
                )))
            }
            _ => {}
        }

        let api = reqwest::Url::parse(&self.api).map_err(|e| {
            ConfigError::InvalidValue(format!("scm.\"{}\": invalid api URL: {}", host, e))
        })?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "scm.\"{}\": api URL must be http or https, got '{}'",
                host,
                api.scheme()
            )));
        }

        Ok(())
    }
}

/// Local checkout settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CheckoutConfig {
    /// Base directory; each repository is cloned into `<install_dir>/<name>`
    pub install_dir: Option<PathBuf>,

    /// Check out the pinned revision when a reference carries one
    pub ensure_pinned: Option<bool>,
}
