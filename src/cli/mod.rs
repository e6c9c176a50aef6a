//! cli
//!
//! Command-line interface layer for reposync.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, merges them over the
//! loaded configuration and hands the batch to [`crate::engine::workflow`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "REPOSYNC_LOG";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. Returns the process
/// exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let ctx = engine::Context {
        config_path: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr `fmt` subscriber.
///
/// `$REPOSYNC_LOG` wins; otherwise `debug` with `--debug` and `warn` without.
fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    // Fails only if a subscriber is already installed, which tests may do.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
