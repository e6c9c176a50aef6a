//! forge
//!
//! Abstraction for remote hosting services.
//!
//! # Architecture
//!
//! The `Forge` trait defines the two calls fork reconciliation needs: an
//! existence probe and fork creation. The engine only sees `dyn Forge`, so
//! tests swap in [`mock::MockForge`] or point [`github::GitHubForge`] at a
//! local HTTP server.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and `ForgeError`
//! - [`github`]: GitHub-compatible REST implementation
//! - [`mock`]: Mock implementation for deterministic testing

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::core::config::HostCredentials;

/// Build one forge per configured host.
///
/// # Errors
///
/// Returns `ForgeError::InvalidConfig` if a client cannot be built.
pub fn forges_for_hosts(
    credentials: BTreeMap<String, HostCredentials>,
) -> Result<HashMap<String, Arc<dyn Forge>>, ForgeError> {
    credentials
        .into_iter()
        .map(|(host, creds)| {
            let forge: Arc<dyn Forge> = Arc::new(github::GitHubForge::new(creds)?);
            Ok((host, forge))
        })
        .collect()
}
