//! cli::commands::fork
//!
//! Ensure forks exist for every configured repository.
//!
//! # Example
//!
//! ```bash
//! # Fork everything from the configuration file
//! reposync fork
//!
//! # Fork two repositories, reporting every failure
//! reposync fork --keep-going https://github.com/a/b https://github.com/c/d
//! ```

use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{finish, load_config, runtime, warn_if_empty, Batch};
use crate::cli::args::BatchArgs;
use crate::engine::{workflow, Context, ForkReconciler};
use crate::forge::forges_for_hosts;

/// Run the fork command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn fork(ctx: &Context, args: &BatchArgs) -> Result<i32> {
    let rt = runtime()?;
    rt.block_on(fork_async(ctx, args))
}

async fn fork_async(ctx: &Context, args: &BatchArgs) -> Result<i32> {
    let config = load_config(ctx)?;
    let batch = Batch::resolve(&config, args)?;
    warn_if_empty(ctx, &batch);

    let credentials = config.credentials().context("failed to read scm credentials")?;
    let forges = forges_for_hosts(credentials).context("failed to set up forge clients")?;
    let reconciler = Arc::new(ForkReconciler::new(forges));

    let report = workflow::run(reconciler, &batch.urls, batch.workers, batch.policy).await?;
    Ok(finish(ctx, &report))
}
