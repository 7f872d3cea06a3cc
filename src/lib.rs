//! Rusty Reaper - find large disposable directory trees, measure them and delete them
//!
//! This crate provides functionality for:
//! - Measuring many candidate directories concurrently with streamed size updates
//! - Deleting confirmed directories sequentially with progress reporting
//! - Formatting byte counts for display

pub mod cleaner;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod scanner;

// Re-export commonly used types
pub use cleaner::{DeleteEngine, DeleteEvent, DeletionOutcome, DeletionProgress, DeletionRequest};
pub use config::Config;
pub use error::{ReaperError, Result};
pub use scanner::{humanize, ScanEngine, ScanEvent, ScanResult, ScanTarget};
