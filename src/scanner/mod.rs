//! Measuring candidate roots.
//!
//! - `walker`: lazy traversal primitive shared with the cleaner
//! - `engine`: concurrent scan engine
//! - `target`: scan targets and candidate discovery
//! - `size`: byte count formatting

mod engine;
mod options;
mod size;
mod target;
pub mod walker;

pub use engine::{CancelHandle, ScanBatch, ScanEngine, ScanEvent, ScanResult};
pub use options::{ScanOptions, DEFAULT_CHANNEL_CAPACITY, DEFAULT_PROGRESS_THRESHOLD};
pub use size::{gigabytes, humanize};
pub use target::{discover_targets, ScanTarget};
pub use walker::{normalize_root, reject_symlink_root, walk, Entry, EntryKind, Order};
