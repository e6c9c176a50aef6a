//! git::interface
//!
//! Git interface implementation on top of the `git` CLI.
//!
//! # Architecture
//!
//! Process execution sits behind the [`CommandRunner`] trait:
//! `run(program, args, cwd) -> (code, stdout, stderr)`. Arguments are always
//! passed as a list and never through a shell, so repository names and URLs
//! cannot inject anything.
//!
//! [`Git`] binds a runner to one working directory and exposes the typed
//! operations checkout reconciliation needs. Every operation treats a
//! non-zero exit as [`GitError::CommandFailed`], carrying the command line,
//! exit code and captured stderr.
//!
//! # Example
//!
//! ```ignore
//! use reposync::git::{Git, SystemRunner};
//! use std::sync::Arc;
//!
//! let git = Git::new(Arc::new(SystemRunner), "/srv/src/log");
//! let head = git.rev_parse("HEAD").await?;
//! println!("checked out at {}", head);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Program name of the git executable.
const GIT: &str = "git";

/// Errors from Git operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitError {
    /// The process could not be started at all.
    #[error("failed to run '{command}': {message}")]
    Spawn {
        /// The command line that was attempted
        command: String,
        /// The OS error
        message: String,
    },

    /// The process exited with a non-zero status.
    #[error("'{command}' exited with code {code}: {stderr}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Exit code (-1 if terminated by a signal)
        code: i32,
        /// Captured standard error, trimmed
        stderr: String,
    },
}

/// Captured result of one process invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (-1 if terminated by a signal)
    pub code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external processes.
///
/// Implementations must be `Send + Sync`; one runner is shared by every
/// worker.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd` and capture its output.
    ///
    /// A non-zero exit is not an error at this level; only failing to start
    /// the process is.
    async fn run(&self, program: &str, args: &[String], cwd: &Path)
        -> std::io::Result<CommandOutput>;
}

/// Runs processes on the host with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            // git must never block a worker on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Summary of `git status -s`.
///
/// Untracked entries (`??`) are counted separately and never make the
/// working tree dirty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Status lines for tracked files with local modifications
    pub tracked: Vec<String>,
    /// Number of untracked files
    pub untracked: usize,
}

impl WorktreeStatus {
    /// Parse the short status format.
    pub fn parse(short_status: &str) -> Self {
        let mut status = WorktreeStatus::default();
        for line in short_status.lines().filter(|l| !l.trim().is_empty()) {
            if line.starts_with("??") {
                status.untracked += 1;
            } else {
                status.tracked.push(line.to_string());
            }
        }
        status
    }

    /// Whether any tracked file has local modifications.
    pub fn has_local_modifications(&self) -> bool {
        !self.tracked.is_empty()
    }
}

/// Git operations bound to one working directory.
#[derive(Clone)]
pub struct Git {
    runner: Arc<dyn CommandRunner>,
    workdir: PathBuf,
}

impl fmt::Debug for Git {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Git")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

impl Git {
    /// Bind `runner` to `workdir`. The directory need not exist yet.
    pub fn new(runner: Arc<dyn CommandRunner>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }

    /// Whether the working directory holds a repository.
    ///
    /// Checks for `.git/config`, which a partially created directory lacks.
    pub fn is_repository(&self) -> bool {
        self.workdir.join(".git").join("config").is_file()
    }

    /// Whether `url` advertises a branch or tag named exactly `name`.
    ///
    /// Runs from the parent directory, which must already exist.
    pub async fn remote_has_ref(&self, url: &str, name: &str) -> Result<bool, GitError> {
        let output = self
            .run_in(self.parent(), &["ls-remote", "--heads", "--tags", url, name])
            .await?;
        Ok(advertises_ref(&output.stdout, name))
    }

    /// Shallow-clone `url` into the working directory.
    ///
    /// With `branch` the clone starts at that branch or tag, otherwise at the
    /// remote's default head. Runs from the parent directory, which must
    /// already exist.
    pub async fn clone_shallow(
        &self,
        url: &str,
        branch: Option<&str>,
    ) -> Result<CommandOutput, GitError> {
        // Relative to the parent, which is where the clone runs.
        let dest = match self.workdir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.workdir.to_string_lossy().into_owned(),
        };
        let mut args = vec!["clone", "--depth", "1"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend([url, dest.as_str()]);
        self.run_in(self.parent(), &args).await
    }

    /// Whether `revision` resolves to a commit present locally.
    pub async fn has_commit(&self, revision: &str) -> Result<bool, GitError> {
        let spec = format!("{revision}^{{commit}}");
        match self.run(&["rev-parse", "--verify", "--quiet", spec.as_str()]).await {
            Ok(_) => Ok(true),
            Err(GitError::CommandFailed { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether the repository has truncated history.
    pub async fn is_shallow(&self) -> Result<bool, GitError> {
        let output = self.run(&["rev-parse", "--is-shallow-repository"]).await?;
        Ok(output.stdout.trim() == "true")
    }

    /// Fetch the complete history of `remote` into a shallow repository.
    pub async fn unshallow(&self, remote: &str) -> Result<CommandOutput, GitError> {
        self.run(&["fetch", "--unshallow", "--tags", remote]).await
    }

    /// Working tree status.
    pub async fn status(&self) -> Result<WorktreeStatus, GitError> {
        let output = self.run(&["status", "-s"]).await?;
        Ok(WorktreeStatus::parse(&output.stdout))
    }

    /// Discard tracked modifications in the index and working tree.
    pub async fn reset_hard(&self) -> Result<CommandOutput, GitError> {
        self.run(&["reset", "--hard", "HEAD"]).await
    }

    /// Resolve a revision to a commit id.
    pub async fn rev_parse(&self, revision: &str) -> Result<String, GitError> {
        let output = self.run(&["rev-parse", revision]).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Point `remote` at `url`.
    pub async fn set_remote_url(
        &self,
        remote: &str,
        url: &str,
    ) -> Result<CommandOutput, GitError> {
        self.run(&["remote", "set-url", remote, url]).await
    }

    /// Fetch `branch` from `remote` together with tags.
    pub async fn fetch_with_tags(
        &self,
        remote: &str,
        branch: &str,
    ) -> Result<CommandOutput, GitError> {
        self.run(&["fetch", remote, branch, "--tags"]).await
    }

    /// Check out `revision`, discarding conflicting local changes.
    pub async fn checkout_force(&self, revision: &str) -> Result<CommandOutput, GitError> {
        self.run(&["checkout", revision, "--force"]).await
    }

    fn parent(&self) -> &Path {
        self.workdir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        self.run_in(&self.workdir, args).await
    }

    async fn run_in(&self, cwd: &Path, args: &[&str]) -> Result<CommandOutput, GitError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let command = format!("{} {}", GIT, args.join(" "));
        tracing::debug!(cwd = %cwd.display(), %command, "running");

        let output = self
            .runner
            .run(GIT, &args, cwd)
            .await
            .map_err(|e| GitError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.success() {
            return Err(GitError::CommandFailed {
                command,
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output)
    }
}

/// Whether `ls-remote` output lists `refs/heads/<name>` or `refs/tags/<name>`.
fn advertises_ref(ls_remote: &str, name: &str) -> bool {
    let branch = format!("refs/heads/{name}");
    let tag = format!("refs/tags/{name}");
    ls_remote
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|r| r == branch || r == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod worktree_status {
        use super::*;

        #[test]
        fn empty_output_is_clean() {
            let status = WorktreeStatus::parse("");
            assert!(!status.has_local_modifications());
            assert_eq!(status.untracked, 0);
        }

        #[test]
        fn untracked_only_is_clean() {
            let status = WorktreeStatus::parse("?? notes.txt\n?? build/\n");
            assert!(!status.has_local_modifications());
            assert_eq!(status.untracked, 2);
        }

        #[test]
        fn modified_tracked_file_is_dirty() {
            let status = WorktreeStatus::parse(" M src/lib.rs\n?? notes.txt\n");
            assert!(status.has_local_modifications());
            assert_eq!(status.tracked, vec![" M src/lib.rs".to_string()]);
            assert_eq!(status.untracked, 1);
        }

        #[test]
        fn staged_and_deleted_are_dirty() {
            let status = WorktreeStatus::parse("A  new.rs\n D gone.rs\nR  a -> b\n");
            assert_eq!(status.tracked.len(), 3);
        }
    }

    mod advertised_refs {
        use super::*;

        const LISTING: &str = "\
1111111111111111111111111111111111111111\trefs/heads/master
2222222222222222222222222222222222222222\trefs/heads/feature/v1
3333333333333333333333333333333333333333\trefs/tags/v2
4444444444444444444444444444444444444444\trefs/tags/v2^{}
";

        #[test]
        fn branches_and_tags_match_exactly() {
            assert!(advertises_ref(LISTING, "master"));
            assert!(advertises_ref(LISTING, "v2"));
            assert!(advertises_ref(LISTING, "feature/v1"));
        }

        #[test]
        fn suffix_matches_and_commit_ids_do_not_count() {
            assert!(!advertises_ref(LISTING, "v1"));
            assert!(!advertises_ref(LISTING, "1111111"));
            assert!(!advertises_ref("", "master"));
        }
    }

    #[tokio::test]
    async fn shallow_clone_arguments() {
        let runner = crate::git::mock::MockRunner::new();
        let git = Git::new(Arc::new(runner.clone()), "/srv/src/widget");

        git.clone_shallow("https://example.com/a/widget", Some("v1"))
            .await
            .unwrap();
        git.clone_shallow("https://example.com/a/widget", None)
            .await
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "clone --depth 1 --branch v1 https://example.com/a/widget widget",
                "clone --depth 1 https://example.com/a/widget widget",
            ]
        );
        assert_eq!(runner.invocations()[0].cwd, PathBuf::from("/srv/src"));
    }

    #[test]
    fn command_output_helpers() {
        assert!(CommandOutput::ok("x").success());
        let failed = CommandOutput::failed(128, "fatal");
        assert!(!failed.success());
        assert_eq!(failed.stderr, "fatal");
    }

    #[test]
    fn git_error_display() {
        let err = GitError::CommandFailed {
            command: "git checkout v2 --force".into(),
            code: 1,
            stderr: "error: pathspec 'v2' did not match".into(),
        };
        assert_eq!(
            err.to_string(),
            "'git checkout v2 --force' exited with code 1: error: pathspec 'v2' did not match"
        );
    }

    #[test]
    fn is_repository_requires_config_marker() {
        let temp = tempfile::TempDir::new().unwrap();
        let git = Git::new(Arc::new(SystemRunner), temp.path());
        assert!(!git.is_repository());

        std::fs::create_dir(temp.path().join(".git")).unwrap();
        assert!(!git.is_repository());

        std::fs::write(temp.path().join(".git/config"), "[core]\n").unwrap();
        assert!(git.is_repository());
    }

    #[tokio::test]
    async fn system_runner_captures_output_and_code() {
        let temp = tempfile::TempDir::new().unwrap();
        let output = SystemRunner
            .run(GIT, &["--version".to_string()], temp.path())
            .await
            .unwrap();
        assert!(output.success());
        assert!(output.stdout.starts_with("git version"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_command_failed() {
        let temp = tempfile::TempDir::new().unwrap();
        let git = Git::new(Arc::new(SystemRunner), temp.path());

        // Not a repository, so rev-parse fails.
        let err = git.rev_parse("HEAD").await.unwrap_err();
        match err {
            GitError::CommandFailed { command, code, .. } => {
                assert_eq!(command, "git rev-parse HEAD");
                assert_ne!(code, 0);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        struct MissingProgram;

        #[async_trait]
        impl CommandRunner for MissingProgram {
            async fn run(
                &self,
                _program: &str,
                args: &[String],
                cwd: &Path,
            ) -> std::io::Result<CommandOutput> {
                SystemRunner
                    .run("reposync-definitely-not-a-program", args, cwd)
                    .await
            }
        }

        let temp = tempfile::TempDir::new().unwrap();
        let git = Git::new(Arc::new(MissingProgram), temp.path());
        let err = git.status().await.unwrap_err();
        assert!(matches!(err, GitError::Spawn { .. }));
    }
}
