//! engine::workflow
//!
//! Drive one reconciler over a batch of reference strings.
//!
//! Each reference becomes one pool task that parses the string and then
//! reconciles it, inside a `reconcile` span. Parsing happens in the task so a
//! malformed reference fails only its own item.

use std::sync::Arc;

use tracing::Instrument;

use super::error::ReconcileError;
use super::pool;
use super::report::{AggregateReport, FailurePolicy, ItemResult, SyncOutcome};
use super::Reconciler;
use crate::core::reference::RepositoryReference;

/// Reconcile every input with at most `workers` in flight.
///
/// Returns one result per input, in input order.
pub async fn run_batch(
    reconciler: Arc<dyn Reconciler>,
    inputs: &[String],
    workers: usize,
) -> Vec<ItemResult> {
    let kind = reconciler.kind();
    tracing::debug!(kind, items = inputs.len(), workers, "starting batch");

    let tasks = inputs.iter().cloned().map(|input| {
        let reconciler = Arc::clone(&reconciler);
        let span = tracing::info_span!(
            "reconcile",
            kind,
            input = %input,
            repo = tracing::field::Empty
        );
        async move { reconcile_one(reconciler.as_ref(), &input).await }.instrument(span)
    });

    let results = pool::run_all(workers, tasks).await;

    inputs
        .iter()
        .cloned()
        .zip(results)
        .map(|(input, result)| ItemResult { input, result })
        .collect()
}

/// Reconcile a batch and aggregate it under `policy`.
///
/// # Errors
///
/// Under [`FailurePolicy::FailFast`], the first failing item in input order.
pub async fn run(
    reconciler: Arc<dyn Reconciler>,
    inputs: &[String],
    workers: usize,
    policy: FailurePolicy,
) -> Result<AggregateReport, ReconcileError> {
    let results = run_batch(reconciler, inputs, workers).await;
    AggregateReport::collect(results, policy)
}

async fn reconcile_one(
    reconciler: &dyn Reconciler,
    input: &str,
) -> Result<SyncOutcome, ReconcileError> {
    let reference = match RepositoryReference::parse(input) {
        Ok(reference) => reference,
        Err(err) => {
            tracing::warn!(error = %err, "rejected reference");
            return Err(ReconcileError::from(err));
        }
    };
    tracing::Span::current().record("repo", reference.identifier().as_str());

    let result = reconciler.reconcile(&reference).await;
    match &result {
        Ok(outcome) => tracing::info!(changed = outcome.changed, "reconciled"),
        Err(err) => tracing::warn!(error = %err, "failed"),
    }
    result
}
