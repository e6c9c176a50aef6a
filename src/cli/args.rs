//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Print the batch report as JSON

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// reposync - keep forks and pinned local clones of many repositories in shape
#[derive(Parser, Debug)]
#[command(name = "reposync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: $REPOSYNC_CONFIG, then the XDG config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the batch report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Arguments shared by every batch command.
#[derive(Args, Debug, Clone, Default)]
pub struct BatchArgs {
    /// Repository references (https://<host>/<owner>/<name>[.git][@<revision>]);
    /// replace `repos` from the configuration file
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Number of repositories processed concurrently
    #[arg(short = 'j', long = "processes", value_name = "N")]
    pub processes: Option<usize>,

    /// Keep going after a failed repository and report every failure
    #[arg(long)]
    pub keep_going: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ensure a fork of each repository exists under the configured account
    #[command(
        name = "fork",
        long_about = "Ensure a fork of each repository exists under the configured account.\n\n\
            For every reference, the hosting API is asked whether <user>/<name> \
            already exists. Only missing forks are requested. Running the command \
            twice in a row makes no changes the second time.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Fork everything listed in the configuration file
    reposync fork

    # Fork specific repositories, four at a time
    reposync fork -j 4 https://github.com/rust-lang/log https://github.com/serde-rs/json

    # Report every failure instead of stopping at the first
    reposync --json fork --keep-going"
    )]
    Fork {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Ensure a local clone of each repository sits at its pinned revision
    #[command(
        name = "checkout",
        long_about = "Ensure a local clone of each repository sits at its pinned revision.\n\n\
            Missing clones are shallow-cloned into <install-dir>/<name>. Existing \
            clones have tracked modifications discarded (untracked files are kept), \
            are fetched, and are force-checked-out at the target revision: the \
            @<revision> suffix when pinning is on, the default branch otherwise.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Sync every configured repository into /srv/src
    reposync checkout --install-dir /srv/src

    # Ignore @<revision> pins and follow the default branch
    reposync checkout --no-pin"
    )]
    Checkout {
        #[command(flatten)]
        batch: BatchArgs,

        /// Directory holding the clones
        #[arg(long, value_name = "DIR")]
        install_dir: Option<PathBuf>,

        /// Honor @<revision> pins (default from configuration)
        #[arg(long, overrides_with = "no_pin")]
        pin: bool,

        /// Ignore @<revision> pins and use the default branch
        #[arg(long, overrides_with = "pin")]
        no_pin: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    reposync completion bash >> ~/.bashrc

    # Fish
    reposync completion fish > ~/.config/fish/completions/reposync.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// Resolve `--pin` / `--no-pin` into an override, if either was given.
pub fn pin_override(pin: bool, no_pin: bool) -> Option<bool> {
    match (pin, no_pin) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
