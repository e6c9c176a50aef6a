//! engine::error
//!
//! Per-item reconciliation errors.
//!
//! Every variant names the item it belongs to so a fail-fast run can report
//! the failing repository without extra bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

use super::pool::PoolError;
use crate::core::reference::ParseError;
use crate::forge::ForgeError;
use crate::git::GitError;

/// Errors from reconciling one repository.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The reference string could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The forge answered the fork request with something other than 202.
    #[error("{repo}: fork creation failed with status {status}: {body}")]
    ForkCreation {
        /// Repository identifier
        repo: String,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// A local process exited with a non-zero status.
    #[error("{repo}: '{command}' exited with code {code}: {stderr}")]
    Command {
        /// Repository identifier
        repo: String,
        /// Command line that failed
        command: String,
        /// Exit code
        code: i32,
        /// Captured standard error
        stderr: String,
    },

    /// A local process could not be started.
    #[error("{repo}: failed to run '{command}': {message}")]
    Spawn {
        /// Repository identifier
        repo: String,
        /// Command line that was attempted
        command: String,
        /// OS error
        message: String,
    },

    /// A forge request failed before an answer was received.
    #[error("{repo}: {source}")]
    Forge {
        /// Repository identifier
        repo: String,
        /// Underlying forge error
        #[source]
        source: ForgeError,
    },

    /// No credentials are configured for the reference's host.
    #[error("{repo}: no scm credentials configured for host '{host}'")]
    MissingCredentials {
        /// Repository identifier
        repo: String,
        /// Host without credentials
        host: String,
    },

    /// A filesystem operation failed.
    #[error("{repo}: cannot create '{}': {source}", path.display())]
    Io {
        /// Repository identifier
        repo: String,
        /// Path being created
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The worker running the item failed.
    #[error(transparent)]
    Worker(#[from] PoolError),
}

impl ReconcileError {
    /// Attach a repository identifier to a git failure.
    pub fn from_git(repo: &str, err: GitError) -> Self {
        match err {
            GitError::CommandFailed {
                command,
                code,
                stderr,
            } => ReconcileError::Command {
                repo: repo.to_string(),
                command,
                code,
                stderr,
            },
            GitError::Spawn { command, message } => ReconcileError::Spawn {
                repo: repo.to_string(),
                command,
                message,
            },
        }
    }

    /// Attach a repository identifier to a forge failure.
    ///
    /// An unexpected status becomes [`ReconcileError::ForkCreation`]; this
    /// is only called on the fork-creation path.
    pub fn from_fork_request(repo: &str, err: ForgeError) -> Self {
        match err {
            ForgeError::UnexpectedStatus { status, body } => ReconcileError::ForkCreation {
                repo: repo.to_string(),
                status,
                body,
            },
            source => ReconcileError::Forge {
                repo: repo.to_string(),
                source,
            },
        }
    }
}
