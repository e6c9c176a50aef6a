//! engine::checkout
//!
//! Ensure a local clone exists and sits at the target revision.
//!
//! # Flow
//!
//! ```text
//! missing  -> create parents -> shallow clone              (old = "n/a")
//! present  -> status -> [reset --hard if tracked changes]  (old = HEAD)
//! always   -> set-url origin -> fetch <default> --tags
//!          -> [fetch --unshallow if target is not local] -> checkout <target> --force
//! finally  -> new = HEAD, changed = old != new
//! ```
//!
//! A fresh clone starts at the target when the remote advertises it as a
//! branch or tag, and at the remote's default head otherwise (commit pins).
//! Untracked files never trigger a reset and survive reconciliation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::error::ReconcileError;
use super::report::{CheckoutDetail, SyncOutcome, NO_PRIOR_REVISION};
use super::Reconciler;
use crate::core::config::DEFAULT_BRANCH;
use crate::core::reference::RepositoryReference;
use crate::git::{CommandRunner, Git, GitError};

/// Remote every managed clone tracks.
const ORIGIN: &str = "origin";

/// Decides which revision a clone should be checked out at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinPolicy {
    /// Honor `@<revision>` suffixes on references
    pub ensure_pinned: bool,
    /// Branch used when no pin applies; also the branch fetched on update
    pub default_branch: String,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            ensure_pinned: true,
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl PinPolicy {
    /// Target revision for `reference`.
    pub fn target<'a>(&'a self, reference: &'a RepositoryReference) -> &'a str {
        match reference.revision() {
            Some(revision) if self.ensure_pinned => revision,
            _ => &self.default_branch,
        }
    }
}

/// Clone/update reconciler rooted at an install directory.
#[derive(Clone)]
pub struct CheckoutReconciler {
    runner: Arc<dyn CommandRunner>,
    install_dir: PathBuf,
    policy: PinPolicy,
}

impl std::fmt::Debug for CheckoutReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutReconciler")
            .field("install_dir", &self.install_dir)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CheckoutReconciler {
    /// Create a reconciler placing clones under `install_dir`.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        install_dir: impl Into<PathBuf>,
        policy: PinPolicy,
    ) -> Self {
        Self {
            runner,
            install_dir: install_dir.into(),
            policy,
        }
    }

    /// Where `reference` is cloned: `<install_dir>/<name>`.
    pub fn destination(&self, reference: &RepositoryReference) -> PathBuf {
        self.install_dir.join(reference.name())
    }

    /// Reconcile the clone of `reference` according to the pin policy.
    pub async fn ensure_checkout(
        &self,
        reference: &RepositoryReference,
    ) -> Result<SyncOutcome, ReconcileError> {
        let destination = self.destination(reference);
        let target = self.policy.target(reference);
        self.reconcile_at(&reference.identifier(), reference.url(), &destination, target)
            .await
    }

    /// Reconcile the clone at `destination` so it tracks `url` at `target`.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Io`] if parent directories cannot be created
    /// - [`ReconcileError::Command`] on the first git command that fails
    /// - [`ReconcileError::Spawn`] if git cannot be started
    pub async fn reconcile_at(
        &self,
        repo: &str,
        url: &str,
        destination: &Path,
        target: &str,
    ) -> Result<SyncOutcome, ReconcileError> {
        let git = Git::new(Arc::clone(&self.runner), destination);
        let git_err = |err: GitError| ReconcileError::from_git(repo, err);

        let old_version = if git.is_repository() {
            let status = git.status().await.map_err(git_err)?;
            if status.has_local_modifications() {
                tracing::debug!(
                    modified = status.tracked.len(),
                    "discarding local modifications"
                );
                git.reset_hard().await.map_err(git_err)?;
            }
            git.rev_parse("HEAD").await.map_err(git_err)?
        } else {
            if let Some(parent) = destination.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ReconcileError::Io {
                        repo: repo.to_string(),
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            let named = git.remote_has_ref(url, target).await.map_err(git_err)?;
            git.clone_shallow(url, named.then_some(target))
                .await
                .map_err(git_err)?;
            NO_PRIOR_REVISION.to_string()
        };

        git.set_remote_url(ORIGIN, url).await.map_err(git_err)?;
        git.fetch_with_tags(ORIGIN, &self.policy.default_branch)
            .await
            .map_err(git_err)?;
        if !git.has_commit(target).await.map_err(git_err)?
            && git.is_shallow().await.map_err(git_err)?
        {
            tracing::debug!(revision = target, "not in shallow history, deepening");
            git.unshallow(ORIGIN).await.map_err(git_err)?;
        }
        let checkout = git.checkout_force(target).await.map_err(git_err)?;
        let new_version = git.rev_parse("HEAD").await.map_err(git_err)?;

        tracing::debug!(%old_version, %new_version, revision = target, "checked out");

        Ok(SyncOutcome::checkout(
            repo,
            CheckoutDetail {
                rc: checkout.code,
                stdout: checkout.stdout,
                stderr: checkout.stderr,
                old_version,
                new_version,
            },
        ))
    }
}

#[async_trait]
impl Reconciler for CheckoutReconciler {
    fn kind(&self) -> &'static str {
        "checkout"
    }

    async fn reconcile(
        &self,
        reference: &RepositoryReference,
    ) -> Result<SyncOutcome, ReconcileError> {
        self.ensure_checkout(reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockRunner;
    use crate::git::CommandOutput;
    use tempfile::TempDir;

    fn reference(s: &str) -> RepositoryReference {
        RepositoryReference::parse(s).unwrap()
    }

    fn fake_repository(path: &Path) {
        std::fs::create_dir_all(path.join(".git")).unwrap();
        std::fs::write(path.join(".git/config"), "[core]\n").unwrap();
    }

    mod pin_policy {
        use super::*;

        #[test]
        fn pinned_reference_uses_its_revision() {
            let policy = PinPolicy::default();
            let r = reference("https://github.com/rust-lang/log.git@0.4.22");
            assert_eq!(policy.target(&r), "0.4.22");
        }

        #[test]
        fn unpinned_reference_uses_default_branch() {
            let policy = PinPolicy {
                ensure_pinned: true,
                default_branch: "main".into(),
            };
            let r = reference("https://github.com/rust-lang/log.git");
            assert_eq!(policy.target(&r), "main");
        }

        #[test]
        fn pinning_disabled_ignores_revision() {
            let policy = PinPolicy {
                ensure_pinned: false,
                default_branch: "master".into(),
            };
            let r = reference("https://github.com/rust-lang/log.git@0.4.22");
            assert_eq!(policy.target(&r), "master");
        }
    }

    #[test]
    fn destination_is_install_dir_plus_name() {
        let reconciler =
            CheckoutReconciler::new(Arc::new(MockRunner::new()), "/srv/src", PinPolicy::default());
        let r = reference("https://github.com/rust-lang/log.git@v1");
        assert_eq!(reconciler.destination(&r), PathBuf::from("/srv/src/log"));
    }

    #[tokio::test]
    async fn missing_clone_is_cloned_then_synced() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new()
            .on(
                &["ls-remote"],
                CommandOutput::ok("c0ffee\trefs/tags/v2\n"),
            )
            .on(&["rev-parse", "HEAD"], CommandOutput::ok("c0ffee\n"));
        let reconciler = CheckoutReconciler::new(
            Arc::new(runner.clone()),
            temp.path().join("nested/src"),
            PinPolicy::default(),
        );

        let outcome = reconciler
            .ensure_checkout(&reference("https://example.com/acme/widget.git@v2"))
            .await
            .unwrap();

        let destination = temp.path().join("nested/src/widget");
        assert!(temp.path().join("nested/src").is_dir());
        assert_eq!(
            runner.command_lines(),
            vec![
                "ls-remote --heads --tags https://example.com/acme/widget.git v2".to_string(),
                "clone --depth 1 --branch v2 https://example.com/acme/widget.git widget".to_string(),
                "remote set-url origin https://example.com/acme/widget.git".to_string(),
                "fetch origin master --tags".to_string(),
                "rev-parse --verify --quiet v2^{commit}".to_string(),
                "checkout v2 --force".to_string(),
                "rev-parse HEAD".to_string(),
            ]
        );
        assert_eq!(runner.invocations()[1].cwd, temp.path().join("nested/src"));
        assert_eq!(runner.invocations()[2].cwd, destination);

        assert!(outcome.changed);
        let detail = outcome.checkout_detail().unwrap();
        assert_eq!(detail.old_version, NO_PRIOR_REVISION);
        assert_eq!(detail.new_version, "c0ffee");
        assert_eq!(detail.rc, 0);
    }

    #[tokio::test]
    async fn dirty_clone_is_reset_before_update() {
        let temp = TempDir::new().unwrap();
        fake_repository(&temp.path().join("widget"));
        let runner = MockRunner::new()
            .on(&["status", "-s"], CommandOutput::ok(" M src/lib.rs\n?? notes.txt\n"))
            .on(&["rev-parse", "HEAD"], CommandOutput::ok("aaa\n"))
            .on(&["rev-parse", "HEAD"], CommandOutput::ok("bbb\n"));
        let reconciler =
            CheckoutReconciler::new(Arc::new(runner.clone()), temp.path(), PinPolicy::default());

        let outcome = reconciler
            .ensure_checkout(&reference("https://example.com/acme/widget@v2"))
            .await
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "status -s".to_string(),
                "reset --hard HEAD".to_string(),
                "rev-parse HEAD".to_string(),
                "remote set-url origin https://example.com/acme/widget".to_string(),
                "fetch origin master --tags".to_string(),
                "rev-parse --verify --quiet v2^{commit}".to_string(),
                "checkout v2 --force".to_string(),
                "rev-parse HEAD".to_string(),
            ]
        );
        assert!(outcome.changed);
        let detail = outcome.checkout_detail().unwrap();
        assert_eq!(detail.old_version, "aaa");
        assert_eq!(detail.new_version, "bbb");
    }

    #[tokio::test]
    async fn untracked_only_clone_is_not_reset() {
        let temp = TempDir::new().unwrap();
        fake_repository(&temp.path().join("widget"));
        let runner = MockRunner::new()
            .on(&["status", "-s"], CommandOutput::ok("?? scratch.txt\n"))
            .on(&["rev-parse", "HEAD"], CommandOutput::ok("aaa\n"));
        let reconciler =
            CheckoutReconciler::new(Arc::new(runner.clone()), temp.path(), PinPolicy::default());

        let outcome = reconciler
            .ensure_checkout(&reference("https://example.com/acme/widget@v1"))
            .await
            .unwrap();

        assert!(!runner.ran(&["reset"]));
        assert!(!outcome.changed);
    }

    #[tokio::test]
    async fn commit_pin_clones_default_head_then_deepens() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new()
            .on(
                &["ls-remote"],
                CommandOutput::ok("1111111111111111111111111111111111111111\trefs/heads/master\n"),
            )
            .on(&["rev-parse", "--verify"], CommandOutput::failed(1, ""))
            .on(&["rev-parse", "--is-shallow-repository"], CommandOutput::ok("true\n"))
            .on(&["rev-parse", "HEAD"], CommandOutput::ok("abc1234def\n"));
        let reconciler =
            CheckoutReconciler::new(Arc::new(runner.clone()), temp.path(), PinPolicy::default());

        let outcome = reconciler
            .ensure_checkout(&reference("https://example.com/acme/widget@abc1234"))
            .await
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "ls-remote --heads --tags https://example.com/acme/widget abc1234".to_string(),
                "clone --depth 1 https://example.com/acme/widget widget".to_string(),
                "remote set-url origin https://example.com/acme/widget".to_string(),
                "fetch origin master --tags".to_string(),
                "rev-parse --verify --quiet abc1234^{commit}".to_string(),
                "rev-parse --is-shallow-repository".to_string(),
                "fetch --unshallow --tags origin".to_string(),
                "checkout abc1234 --force".to_string(),
                "rev-parse HEAD".to_string(),
            ]
        );
        let detail = outcome.checkout_detail().unwrap();
        assert_eq!(detail.old_version, NO_PRIOR_REVISION);
        assert_eq!(detail.new_version, "abc1234def");
    }

    #[tokio::test]
    async fn complete_history_is_not_deepened() {
        let temp = TempDir::new().unwrap();
        fake_repository(&temp.path().join("widget"));
        let runner = MockRunner::new()
            .on(&["rev-parse", "--verify"], CommandOutput::failed(1, ""))
            .on(&["rev-parse", "--is-shallow-repository"], CommandOutput::ok("false\n"));
        let reconciler =
            CheckoutReconciler::new(Arc::new(runner.clone()), temp.path(), PinPolicy::default());

        reconciler
            .ensure_checkout(&reference("https://example.com/acme/widget@abc1234"))
            .await
            .unwrap();

        assert!(!runner.ran(&["fetch", "--unshallow"]));
        assert!(runner.ran(&["checkout", "abc1234", "--force"]));
    }

    #[tokio::test]
    async fn fetch_uses_configured_default_branch() {
        let temp = TempDir::new().unwrap();
        fake_repository(&temp.path().join("widget"));
        let runner = MockRunner::new();
        let policy = PinPolicy {
            ensure_pinned: false,
            default_branch: "trunk".into(),
        };
        let reconciler = CheckoutReconciler::new(Arc::new(runner.clone()), temp.path(), policy);

        reconciler
            .ensure_checkout(&reference("https://example.com/acme/widget@v1"))
            .await
            .unwrap();

        assert!(runner.ran(&["fetch", "origin", "trunk", "--tags"]));
        assert!(runner.ran(&["checkout", "trunk", "--force"]));
    }

    #[tokio::test]
    async fn failing_command_names_repo_and_command() {
        let temp = TempDir::new().unwrap();
        fake_repository(&temp.path().join("widget"));
        let runner = MockRunner::new().on(
            &["fetch"],
            CommandOutput::failed(128, "fatal: couldn't find remote ref master\n"),
        );
        let reconciler =
            CheckoutReconciler::new(Arc::new(runner.clone()), temp.path(), PinPolicy::default());

        let err = reconciler
            .ensure_checkout(&reference("https://example.com/acme/widget@v1"))
            .await
            .unwrap_err();

        match err {
            ReconcileError::Command {
                repo,
                command,
                code,
                stderr,
            } => {
                assert_eq!(repo, "acme/widget");
                assert_eq!(command, "git fetch origin master --tags");
                assert_eq!(code, 128);
                assert_eq!(stderr, "fatal: couldn't find remote ref master");
            }
            other => panic!("expected Command, got {other:?}"),
        }
        assert!(!runner.ran(&["checkout"]));
    }
}
