//! Deleting confirmed roots.
//!
//! This module provides:
//! - Bottom-up removal of a single tree with coalesced progress
//! - A sequential batch engine streaming progress and per-root outcomes

mod executor;
mod orchestrator;

pub use executor::{
    DeletionOutcome, DeletionProgress, DeletionRequest, RemovalReport, RootRemover,
    DEFAULT_PROGRESS_INTERVAL,
};
pub use orchestrator::{DeleteBatch, DeleteEngine, DeleteEvent, DeleteOptions, DeleteSummary};
