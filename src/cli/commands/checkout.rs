//! cli::commands::checkout
//!
//! Ensure local clones of every configured repository sit at their pinned
//! revision.
//!
//! # Example
//!
//! ```bash
//! # Sync every configured repository into the configured install_dir
//! reposync checkout
//!
//! # Follow the default branch instead of @<revision> pins
//! reposync checkout --no-pin --install-dir /srv/src
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::{finish, load_config, runtime, warn_if_empty, Batch};
use crate::cli::args::BatchArgs;
use crate::engine::{workflow, CheckoutReconciler, Context, PinPolicy};
use crate::git::SystemRunner;

/// Run the checkout command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn checkout(
    ctx: &Context,
    args: &BatchArgs,
    install_dir: Option<PathBuf>,
    pin: Option<bool>,
) -> Result<i32> {
    let rt = runtime()?;
    rt.block_on(checkout_async(ctx, args, install_dir, pin))
}

async fn checkout_async(
    ctx: &Context,
    args: &BatchArgs,
    install_dir: Option<PathBuf>,
    pin: Option<bool>,
) -> Result<i32> {
    let config = load_config(ctx)?;
    let batch = Batch::resolve(&config, args)?;
    warn_if_empty(ctx, &batch);

    let install_dir = install_dir
        .or_else(|| config.install_dir().map(PathBuf::from))
        .ok_or_else(|| {
            anyhow!("no install directory: pass --install-dir or set checkout.install_dir")
        })?;

    let policy = PinPolicy {
        ensure_pinned: pin.unwrap_or_else(|| config.ensure_pinned()),
        default_branch: config.default_branch().to_string(),
    };
    tracing::debug!(install_dir = %install_dir.display(), ?policy, "checkout settings");

    let reconciler = Arc::new(CheckoutReconciler::new(
        Arc::new(SystemRunner),
        install_dir,
        policy,
    ));

    let report = workflow::run(reconciler, &batch.urls, batch.workers, batch.policy).await?;
    Ok(finish(ctx, &report))
}
