//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each batch handler:
//! 1. Loads configuration and merges command-line overrides
//! 2. Builds a reconciler and runs the batch through the engine
//! 3. Formats and displays the report
//!
//! # Async Commands
//!
//! Batch commands do network and process I/O on a multi-threaded tokio
//! runtime. Each handler builds the runtime and blocks on the async
//! implementation, so dispatch itself stays synchronous.

mod checkout;
mod completion;
mod fork;

pub use checkout::checkout;
pub use completion::completion;
pub use fork::fork;

use anyhow::{bail, Context as _, Result};

use super::args::{pin_override, BatchArgs, Command};
use crate::core::config::Config;
use crate::engine::{AggregateReport, Context, FailurePolicy};
use crate::ui::output::{self, Verbosity};

/// Dispatch a parsed command to its handler and return the exit code.
pub fn dispatch(command: Command, ctx: &Context) -> Result<i32> {
    match command {
        Command::Fork { batch } => fork(ctx, &batch),
        Command::Checkout {
            batch,
            install_dir,
            pin,
            no_pin,
        } => checkout(ctx, &batch, install_dir, pin_override(pin, no_pin)),
        Command::Completion { shell } => completion(shell).map(|()| 0),
    }
}

/// Inputs shared by every batch command after merging flags over config.
#[derive(Debug)]
struct Batch {
    urls: Vec<String>,
    workers: usize,
    policy: FailurePolicy,
}

impl Batch {
    /// Merge `args` over `config`.
    fn resolve(config: &Config, args: &BatchArgs) -> Result<Self> {
        let urls = if args.urls.is_empty() {
            config.repos().to_vec()
        } else {
            args.urls.clone()
        };

        let workers = match args.processes {
            Some(0) => bail!("--processes must be at least 1"),
            Some(n) => n,
            None => config.processes(),
        };

        let policy = if args.keep_going {
            FailurePolicy::CollectAll
        } else {
            FailurePolicy::FailFast
        };

        Ok(Self {
            urls,
            workers,
            policy,
        })
    }
}

fn load_config(ctx: &Context) -> Result<Config> {
    let config = Config::load(ctx.config_path.as_deref()).context("failed to load configuration")?;
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

/// Print the report and turn it into an exit code.
fn finish(ctx: &Context, report: &AggregateReport) -> i32 {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    output::report(report, ctx.json, verbosity);
    for failure in &report.failures {
        output::debug(
            format_args!("{} failed: {}", failure.identifier, failure.message),
            verbosity,
        );
    }
    report.rc()
}

fn warn_if_empty(ctx: &Context, batch: &Batch) {
    if batch.urls.is_empty() {
        output::warn(
            "no repositories given on the command line or in the configuration",
            Verbosity::from_flags(ctx.quiet, ctx.debug),
        );
    }
}
