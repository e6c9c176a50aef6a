//! engine
//!
//! Desired-state reconciliation of repositories.
//!
//! # Architecture
//!
//! ```text
//! inputs -> WorkerPool (bounded) -> [parse -> Reconciler] per item -> AggregateReport
//! ```
//!
//! - [`pool`] runs one task per reference with bounded concurrency and
//!   returns results in submission order
//! - [`fork`] ensures a fork exists through a [`crate::forge::Forge`]
//! - [`checkout`] ensures a local clone sits at the target revision
//! - [`report`] aggregates per-item outcomes under a [`FailurePolicy`]
//! - [`workflow`] ties them together
//!
//! # Invariants
//!
//! - Every reconciler is idempotent: a second run against unchanged state
//!   reports `changed = false` and mutates nothing
//! - Every submitted item runs to completion before the batch is judged
//! - Reconcilers receive their configuration up front and never mutate it
//!
//! # Example
//!
//! ```ignore
//! use reposync::engine::{workflow, FailurePolicy, ForkReconciler};
//! use std::sync::Arc;
//!
//! let reconciler = Arc::new(ForkReconciler::new(forges));
//! let report = workflow::run(reconciler, &urls, 10, FailurePolicy::FailFast).await?;
//! println!("changed: {}", report.overall_changed);
//! ```

pub mod checkout;
pub mod error;
pub mod fork;
pub mod pool;
pub mod report;
pub mod workflow;

pub use checkout::{CheckoutReconciler, PinPolicy};
pub use error::ReconcileError;
pub use fork::ForkReconciler;
pub use pool::{run_all, PoolError, TaskHandle, WorkerPool};
pub use report::{
    aggregate, AggregateReport, CheckoutDetail, FailurePolicy, ItemFailure, ItemResult,
    OutcomeDetail, SyncOutcome, NO_PRIOR_REVISION,
};

use std::path::PathBuf;

use async_trait::async_trait;

use crate::core::reference::RepositoryReference;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Machine-readable output.
    pub json: bool,
}

/// One kind of desired-state reconciliation.
///
/// Implementations are shared by every worker of a batch.
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    /// Short name used in logs (`fork`, `checkout`).
    fn kind(&self) -> &'static str;

    /// Bring `reference` to its desired state.
    async fn reconcile(
        &self,
        reference: &RepositoryReference,
    ) -> Result<SyncOutcome, ReconcileError>;
}
