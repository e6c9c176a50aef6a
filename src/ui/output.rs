//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, the batch report is printed as one JSON object:
//!
//! ```text
//! {"changed": bool, "rc": 0|1, "results": [...], "failures": [...]}
//! ```
//!
//! Fork items render as `{repo_name, changed}`; checkout items as
//! `{repo_name, rc, stdout, stderr, changed, old_version, new_version}`.
//! `failures` is present only when some item failed under `--keep-going`.

use std::fmt::Display;

use serde_json::{json, Value};

use crate::engine::{AggregateReport, OutcomeDetail, SyncOutcome};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a batch report as text or JSON.
///
/// JSON is printed even in quiet mode; it is what scripts consume.
pub fn report(report: &AggregateReport, json: bool, verbosity: Verbosity) {
    if json {
        println!("{}", report_json(report));
    } else {
        print(format_report(report), verbosity);
    }
}

/// Render a report as the JSON document described in the module docs.
pub fn report_json(report: &AggregateReport) -> Value {
    let mut doc = json!({
        "changed": report.overall_changed,
        "rc": report.rc(),
        "results": report.items.iter().map(item_json).collect::<Vec<_>>(),
    });
    if !report.failures.is_empty() {
        doc["failures"] = json!(report.failures);
    }
    doc
}

fn item_json(outcome: &SyncOutcome) -> Value {
    match &outcome.detail {
        OutcomeDetail::Fork => json!({
            "repo_name": outcome.identifier,
            "changed": outcome.changed,
        }),
        OutcomeDetail::Checkout(detail) => json!({
            "repo_name": outcome.identifier,
            "rc": detail.rc,
            "stdout": detail.stdout,
            "stderr": detail.stderr,
            "changed": outcome.changed,
            "old_version": detail.old_version,
            "new_version": detail.new_version,
        }),
    }
}

/// Render a report as text: one line per item, then `changed: <bool>`.
pub fn format_report(report: &AggregateReport) -> String {
    let mut lines: Vec<String> = report.items.iter().map(format_item).collect();
    lines.extend(
        report
            .failures
            .iter()
            .map(|f| format!("{}: failed: {}", f.identifier, f.message)),
    );
    lines.push(format!("changed: {}", report.overall_changed));
    lines.join("\n")
}

fn format_item(outcome: &SyncOutcome) -> String {
    match &outcome.detail {
        OutcomeDetail::Fork if outcome.changed => format!("{}: fork created", outcome.identifier),
        OutcomeDetail::Fork => format!("{}: fork exists", outcome.identifier),
        OutcomeDetail::Checkout(detail) if outcome.changed => format!(
            "{}: {} -> {}",
            outcome.identifier,
            short(&detail.old_version),
            short(&detail.new_version)
        ),
        OutcomeDetail::Checkout(detail) => format!(
            "{}: up to date at {}",
            outcome.identifier,
            short(&detail.new_version)
        ),
    }
}

/// Abbreviate a commit id for display.
fn short(revision: &str) -> &str {
    revision.get(..12).unwrap_or(revision)
}
