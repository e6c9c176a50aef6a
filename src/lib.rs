//! reposync - desired-state reconciliation for many repositories
//!
//! Given a list of repository references (`https://<host>/<owner>/<name>[@<rev>]`),
//! reposync ensures that a fork exists under a configured account on the
//! hosting service, and that a local clone exists and sits at the pinned
//! revision. Work runs on a bounded pool of async workers and every item is
//! reported with a `changed` flag.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Worker pool, reconcilers and result aggregation
//! - [`core`] - Reference parsing and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`forge`] - Abstraction for remote hosting services
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Reconciliation is idempotent: an unchanged world yields `changed = false`
//! 2. Every submitted item runs to completion before the batch is judged
//! 3. Results are reported in input order
//! 4. Untracked files in a clone are never discarded

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod git;
pub mod ui;
