//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock keeps the set of existing repositories in memory. Creating a fork
//! adds `<account>/<repo>` to that set, so a second reconciliation sees the
//! fork as present. Failures can be configured per operation and every call
//! is recorded for verification.
//!
//! # Example
//!
//! ```
//! use reposync::forge::mock::MockForge;
//! use reposync::forge::Forge;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new("bot").with_repo("octocat", "hello");
//!
//! assert!(forge.repo_exists("octocat", "hello").await.unwrap());
//! assert!(!forge.repo_exists("bot", "hello").await.unwrap());
//!
//! forge.create_fork("octocat", "hello").await.unwrap();
//! assert!(forge.repo_exists("bot", "hello").await.unwrap());
//! # });
//! ```

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{Forge, ForgeError};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    account: String,
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockForgeInner {
    /// Existing repositories as `owner/repo`.
    repos: BTreeSet<String>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail repo_exists with the given error.
    RepoExists(ForgeError),
    /// Fail create_fork with the given error.
    CreateFork(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    RepoExists { owner: String, repo: String },
    CreateFork { owner: String, repo: String },
}

impl MockForge {
    /// Create a mock forge for `account` with no repositories.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            inner: Arc::new(Mutex::new(MockForgeInner::default())),
        }
    }

    /// Add an existing repository.
    pub fn with_repo(self, owner: &str, repo: &str) -> Self {
        self.lock().repos.insert(format!("{}/{}", owner, repo));
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Number of fork creation requests received.
    pub fn create_fork_calls(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::CreateFork { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeInner> {
        // A panicking test thread must not hide the recorded state from others.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Forge for MockForge {
    fn account(&self) -> &str {
        &self.account
    }

    async fn repo_exists(&self, owner: &str, repo: &str) -> Result<bool, ForgeError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::RepoExists {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });

        if let Some(FailOn::RepoExists(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        Ok(inner.repos.contains(&format!("{}/{}", owner, repo)))
    }

    async fn create_fork(&self, owner: &str, repo: &str) -> Result<(), ForgeError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::CreateFork {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });

        if let Some(FailOn::CreateFork(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        inner.repos.insert(format!("{}/{}", self.account, repo));
        Ok(())
    }
}
