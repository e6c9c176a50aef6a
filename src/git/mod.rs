//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. Reconcilers never build a
//! `git` command line themselves; they call typed operations on [`Git`],
//! which runs them through a [`CommandRunner`].
//!
//! # Responsibilities
//!
//! - Presence detection (`.git/config`)
//! - Shallow clone at a ref
//! - Working tree status, ignoring untracked files
//! - Hard reset, ref resolution, remote repointing, fetch, forced checkout
//!
//! # Invariants
//!
//! - Arguments are passed as a list, never through a shell
//! - A non-zero exit is always an error carrying command, code and stderr
//!
//! # Example
//!
//! ```ignore
//! use reposync::git::{Git, SystemRunner};
//! use std::sync::Arc;
//!
//! let git = Git::new(Arc::new(SystemRunner), "/srv/src/log");
//! if git.status().await?.has_local_modifications() {
//!     git.reset_hard().await?;
//! }
//! ```

mod interface;
pub mod mock;

pub use interface::{CommandOutput, CommandRunner, Git, GitError, SystemRunner, WorktreeStatus};
