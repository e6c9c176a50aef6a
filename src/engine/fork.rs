//! engine::fork
//!
//! Ensure a fork of each repository exists under the configured account.
//!
//! The reconciler probes for `<account>/<name>` and only asks the forge to
//! create a fork when the probe says it is missing. Running it twice in a row
//! issues no creation request the second time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::ReconcileError;
use super::report::SyncOutcome;
use super::Reconciler;
use crate::core::reference::RepositoryReference;
use crate::forge::Forge;

/// Fork reconciler over one forge client per host.
#[derive(Clone, Default)]
pub struct ForkReconciler {
    forges: HashMap<String, Arc<dyn Forge>>,
}

impl std::fmt::Debug for ForkReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut hosts: Vec<&String> = self.forges.keys().collect();
        hosts.sort();
        f.debug_struct("ForkReconciler")
            .field("hosts", &hosts)
            .finish()
    }
}

impl ForkReconciler {
    /// Create a reconciler from forge clients keyed by host.
    pub fn new(forges: HashMap<String, Arc<dyn Forge>>) -> Self {
        Self { forges }
    }

    /// Register the client for `host`.
    pub fn with_forge(mut self, host: impl Into<String>, forge: Arc<dyn Forge>) -> Self {
        self.forges.insert(host.into(), forge);
        self
    }

    /// Ensure the fork of `reference` exists.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::MissingCredentials`] if no forge serves the host
    /// - [`ReconcileError::ForkCreation`] if creation is answered with anything but 202
    /// - [`ReconcileError::Forge`] on transport failures
    pub async fn ensure_fork(
        &self,
        reference: &RepositoryReference,
    ) -> Result<SyncOutcome, ReconcileError> {
        let repo = reference.identifier();
        let forge = self.forges.get(reference.host()).ok_or_else(|| {
            ReconcileError::MissingCredentials {
                repo: repo.clone(),
                host: reference.host().to_string(),
            }
        })?;

        let exists = forge
            .repo_exists(forge.account(), reference.name())
            .await
            .map_err(|source| ReconcileError::Forge {
                repo: repo.clone(),
                source,
            })?;

        if exists {
            tracing::debug!(account = forge.account(), "fork already present");
            return Ok(SyncOutcome::fork(repo, false));
        }

        forge
            .create_fork(reference.owner(), reference.name())
            .await
            .map_err(|err| ReconcileError::from_fork_request(&repo, err))?;

        tracing::debug!(account = forge.account(), "fork requested");
        Ok(SyncOutcome::fork(repo, true))
    }
}

#[async_trait]
impl Reconciler for ForkReconciler {
    fn kind(&self) -> &'static str {
        "fork"
    }

    async fn reconcile(
        &self,
        reference: &RepositoryReference,
    ) -> Result<SyncOutcome, ReconcileError> {
        self.ensure_fork(reference).await
    }
}
