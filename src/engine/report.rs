//! engine::report
//!
//! Per-item outcomes and their aggregation into one batch report.
//!
//! # Aggregation
//!
//! The batch `changed` flag is the logical OR of item flags (false for an
//! empty batch). Items keep input order. How failures are treated depends on
//! the [`FailurePolicy`]:
//!
//! - [`FailurePolicy::FailFast`]: the first failure in input order aborts the
//!   batch and is returned as the error. Every task has still run to
//!   completion by the time results reach this module.
//! - [`FailurePolicy::CollectAll`]: failures are recorded next to the
//!   successful items and the report's return code becomes 1.

use serde::Serialize;

use super::error::ReconcileError;

/// Placeholder for the previous revision of a freshly cloned repository.
pub const NO_PRIOR_REVISION: &str = "n/a";

/// The result of reconciling one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// `owner/name` of the repository
    pub identifier: String,
    /// Whether anything was mutated
    pub changed: bool,
    /// Kind-specific detail
    pub detail: OutcomeDetail,
}

impl SyncOutcome {
    /// A fork outcome.
    pub fn fork(identifier: impl Into<String>, changed: bool) -> Self {
        Self {
            identifier: identifier.into(),
            changed,
            detail: OutcomeDetail::Fork,
        }
    }

    /// A checkout outcome.
    ///
    /// `changed` is derived from whether the revision moved.
    pub fn checkout(identifier: impl Into<String>, detail: CheckoutDetail) -> Self {
        Self {
            identifier: identifier.into(),
            changed: detail.old_version != detail.new_version,
            detail: OutcomeDetail::Checkout(detail),
        }
    }

    /// Checkout detail, if this is a checkout outcome.
    pub fn checkout_detail(&self) -> Option<&CheckoutDetail> {
        match &self.detail {
            OutcomeDetail::Checkout(detail) => Some(detail),
            OutcomeDetail::Fork => None,
        }
    }
}

/// Kind-specific part of an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeDetail {
    /// A fork was ensured; nothing beyond `changed` to report.
    Fork,
    /// A local clone was ensured.
    Checkout(CheckoutDetail),
}

/// What the last checkout command reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutDetail {
    /// Exit code of the final checkout command
    pub rc: i32,
    /// Its standard output
    pub stdout: String,
    /// Its standard error
    pub stderr: String,
    /// Commit before reconciliation, or [`NO_PRIOR_REVISION`]
    pub old_version: String,
    /// Commit after reconciliation
    pub new_version: String,
}

/// How a batch treats per-item failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort on the first failure in input order.
    #[default]
    FailFast,
    /// Keep going and report every failure.
    CollectAll,
}

/// The result of one item together with the input that produced it.
#[derive(Debug)]
pub struct ItemResult {
    /// The reference string as supplied
    pub input: String,
    /// What happened
    pub result: Result<SyncOutcome, ReconcileError>,
}

/// A failed item in a [`FailurePolicy::CollectAll`] batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// The reference string as supplied
    pub identifier: String,
    /// Rendered error
    pub message: String,
}

/// The aggregated result of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    /// True if any item changed something
    pub overall_changed: bool,
    /// Successful outcomes in input order
    pub items: Vec<SyncOutcome>,
    /// Failed items in input order (only under `CollectAll`)
    pub failures: Vec<ItemFailure>,
}

impl AggregateReport {
    /// Apply `policy` to a batch of item results.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::FailFast`], returns the first failure in input
    /// order. `CollectAll` never fails.
    pub fn collect(
        results: Vec<ItemResult>,
        policy: FailurePolicy,
    ) -> Result<AggregateReport, ReconcileError> {
        let mut outcomes = Vec::with_capacity(results.len());
        let mut failures = Vec::new();

        for item in results {
            match (item.result, policy) {
                (Ok(outcome), _) => outcomes.push(outcome),
                (Err(err), FailurePolicy::FailFast) => return Err(err),
                (Err(err), FailurePolicy::CollectAll) => failures.push(ItemFailure {
                    identifier: item.input,
                    message: err.to_string(),
                }),
            }
        }

        let mut report = aggregate(outcomes);
        report.failures = failures;
        Ok(report)
    }

    /// Process return code: 0 when no item failed, 1 otherwise.
    pub fn rc(&self) -> i32 {
        if self.failures.is_empty() {
            0
        } else {
            1
        }
    }

    /// Number of items that changed something.
    pub fn changed_count(&self) -> usize {
        self.items.iter().filter(|o| o.changed).count()
    }
}

/// Combine successful outcomes into a report.
pub fn aggregate(outcomes: Vec<SyncOutcome>) -> AggregateReport {
    AggregateReport {
        overall_changed: outcomes.iter().any(|o| o.changed),
        items: outcomes,
        failures: Vec::new(),
    }
}
