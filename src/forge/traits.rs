//! forge::traits
//!
//! Forge trait definition for interacting with remote hosting services.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! A forge is bound to one account on one host; the account is the owner of
//! every fork the forge creates.
//!
//! # Example
//!
//! ```ignore
//! use reposync::forge::Forge;
//!
//! async fn ensure_fork(forge: &dyn Forge, owner: &str, repo: &str) -> Result<bool, ForgeError> {
//!     if forge.repo_exists(forge.account(), repo).await? {
//!         return Ok(false);
//!     }
//!     forge.create_fork(owner, repo).await?;
//!     Ok(true)
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

/// Errors from forge operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// The API answered with a status the operation does not accept.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The forge could not be constructed or a request could not be built.
    #[error("invalid forge configuration: {0}")]
    InvalidConfig(String),
}

/// The Forge trait for interacting with remote hosting services.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one forge can be shared by every
/// worker reconciling repositories on its host.
#[async_trait]
pub trait Forge: Send + Sync {
    /// The account forks are created under.
    fn account(&self) -> &str;

    /// Check whether `owner/repo` exists.
    ///
    /// A moved repository (HTTP 301) still counts as present.
    ///
    /// # Errors
    ///
    /// - `NetworkError` if the request could not be sent
    async fn repo_exists(&self, owner: &str, repo: &str) -> Result<bool, ForgeError>;

    /// Fork `owner/repo` into [`Forge::account`].
    ///
    /// Succeeds only when the forge accepts the request (HTTP 202).
    ///
    /// # Errors
    ///
    /// - `UnexpectedStatus` carrying the status and body for any other answer
    /// - `NetworkError` if the request could not be sent
    async fn create_fork(&self, owner: &str, repo: &str) -> Result<(), ForgeError>;
}
