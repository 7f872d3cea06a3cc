//! Executor for removing a single root.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReaperError;
use crate::scanner::{normalize_root, reject_symlink_root, walk, Entry, EntryKind, Order};

/// Files removed between two progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 50;

/// A confirmed request to delete one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionRequest {
    pub root_path: PathBuf,
    /// File count reported by the scan; used for progress totals only
    pub expected_file_count: u64,
}

impl DeletionRequest {
    pub fn new(root_path: impl Into<PathBuf>, expected_file_count: u64) -> Self {
        Self {
            root_path: root_path.into(),
            expected_file_count,
        }
    }
}

/// Coalesced progress signal emitted while a root is being removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionProgress {
    pub root_path: PathBuf,
    pub files_deleted_so_far: u64,
    /// Most recently removed file
    pub current_file: PathBuf,
}

/// Terminal result for one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub root_path: PathBuf,
    /// True when no entry failed to be removed
    pub succeeded: bool,
    /// Files, links and directories actually removed
    pub removed_entry_count: u64,
    /// Entries that could not be removed
    pub failed_entry_count: u64,
}

impl DeletionOutcome {
    /// Outcome for a root that was not touched at all.
    pub fn untouched(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            succeeded: false,
            removed_entry_count: 0,
            failed_entry_count: 0,
        }
    }
}

/// What happened to one root.
#[derive(Debug)]
pub struct RemovalReport {
    pub outcome: DeletionOutcome,
    /// Storage failure that stopped the removal; the batch must not go on
    pub fatal: Option<ReaperError>,
}

/// Removes a directory tree bottom-up, one entry at a time.
pub struct RootRemover {
    progress_interval: u64,
}

impl RootRemover {
    /// Create a remover that reports progress every `progress_interval` files.
    pub fn new(progress_interval: u64) -> Self {
        Self {
            progress_interval: progress_interval.max(1),
        }
    }

    /// Remove `root` and everything below it.
    ///
    /// Symbolic links are unlinked, never followed. A symbolic link given as the
    /// root is refused and left in place. A root that does not exist counts as
    /// already removed. Failures on single entries are logged and counted; only a
    /// storage failure stops the walk early.
    pub fn remove<F>(&self, root: &Path, mut on_progress: F) -> RemovalReport
    where
        F: FnMut(DeletionProgress),
    {
        // Outcomes keep the caller's spelling; the filesystem only sees `fs_root`
        let fs_root = normalize_root(root);

        if let Err(err) = reject_symlink_root(&fs_root) {
            tracing::error!(root = %root.display(), error = %err, "Refusing to delete root");
            let fatal = err.is_fatal().then_some(err);
            return RemovalReport {
                outcome: DeletionOutcome::untouched(root),
                fatal,
            };
        }

        let mut removed = 0u64;
        let mut files = 0u64;
        let mut failed = 0u64;

        for entry in walk(&fs_root, Order::ContentsFirst) {
            let result = match entry {
                Ok(Entry {
                    path,
                    kind: EntryKind::File { .. } | EntryKind::Symlink | EntryKind::Other,
                    ..
                }) => fs::remove_file(&path)
                    .map(|()| {
                        tracing::debug!(path = %path.display(), "Deleted file");
                        removed += 1;
                        files += 1;
                        if files % self.progress_interval == 0 {
                            on_progress(DeletionProgress {
                                root_path: root.to_path_buf(),
                                files_deleted_so_far: files,
                                current_file: path.clone(),
                            });
                        }
                    })
                    .map_err(|e| ReaperError::from_io(&path, e)),
                Ok(Entry {
                    path,
                    kind: EntryKind::Directory,
                    ..
                }) => fs::remove_dir(&path)
                    .map(|()| {
                        tracing::debug!(path = %path.display(), "Deleted directory");
                        removed += 1;
                    })
                    .map_err(|e| ReaperError::from_io(&path, e)),
                Err(err) => Err(err),
            };

            match result {
                Ok(()) => {}
                // Gone already: whoever removed it did our job
                Err(ReaperError::PathNotFound(path)) => {
                    tracing::debug!(path = %path.display(), "Entry vanished before removal");
                }
                Err(err) if err.is_fatal() => {
                    tracing::error!(root = %root.display(), error = %err, "Storage failure, stopping");
                    return RemovalReport {
                        outcome: DeletionOutcome {
                            root_path: root.to_path_buf(),
                            succeeded: false,
                            removed_entry_count: removed,
                            failed_entry_count: failed + 1,
                        },
                        fatal: Some(err),
                    };
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to delete entry");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            let err = ReaperError::PartialDeletion {
                path: root.to_path_buf(),
                failed,
            };
            tracing::warn!(error = %err, removed, "Root only partially deleted");
        }

        RemovalReport {
            outcome: DeletionOutcome {
                root_path: root.to_path_buf(),
                succeeded: failed == 0,
                removed_entry_count: removed,
                failed_entry_count: failed,
            },
            fatal: None,
        }
    }
}

impl Default for RootRemover {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}
