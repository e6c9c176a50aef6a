//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Message printing and batch report rendering
//!
//! # Design
//!
//! All user-facing output goes through this module so quiet mode and
//! `--json` are honored in one place. Diagnostics go through `tracing`
//! instead and land on stderr.

pub mod output;
