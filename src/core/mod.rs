//! core
//!
//! Core domain types for reposync.
//!
//! # Modules
//!
//! - [`reference`] - Repository reference parsing
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states: a parsed reference never has an
//!   empty host, owner or name
//! - Schemas are strict and self-describing
//! - Configuration is read once and never mutated during a run

pub mod config;
pub mod reference;
