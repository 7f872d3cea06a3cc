use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{ReaperError, Result};

/// A root directory the caller wants measured.
/// Immutable once handed to the scan engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTarget {
    /// Caller-chosen identifier (defaults to the full path)
    pub identifier: String,

    /// Directory to walk
    pub root_path: PathBuf,

    /// Short display name
    pub label: String,

    /// Last modification time of the root, if it could be read
    pub last_modified: Option<SystemTime>,
}

impl ScanTarget {
    /// Build a target with an explicit label and no timestamp.
    pub fn new(root_path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        let root_path = root_path.into();
        Self {
            identifier: root_path.display().to_string(),
            root_path,
            label: label.into(),
            last_modified: None,
        }
    }

    /// Build a target from a path, using its file name as label and its mtime.
    ///
    /// The path does not need to exist.
    pub fn from_path(path: &Path) -> Self {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mut target = Self::new(path, label);
        target.last_modified = fs::symlink_metadata(path)
            .and_then(|m| m.modified())
            .ok();
        target
    }

    /// Replace the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

/// List the candidate roots directly below `base`.
///
/// Only real, non-empty directories qualify: plain files, symbolic links and
/// empty directories are skipped. Results are sorted by label.
pub fn discover_targets(base: &Path) -> Result<Vec<ScanTarget>> {
    let read_dir = fs::read_dir(base).map_err(|e| ReaperError::from_io(base, e))?;

    let mut targets: Vec<ScanTarget> = read_dir
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!(base = %base.display(), error = %err, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| !is_empty_dir(path))
        .map(|path| ScanTarget::from_path(&path))
        .collect();

    targets.sort_by(|a, b| a.label.cmp(&b.label));

    tracing::debug!(base = %base.display(), count = targets.len(), "Discovered candidates");
    Ok(targets)
}

fn is_empty_dir(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut rd) => rd.next().is_none(),
        // Unreadable directories are still offered; the scan will report what it can
        Err(_) => false,
    }
}
