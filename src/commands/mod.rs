//! Subcommand implementations.

pub mod delete;
pub mod scan;
