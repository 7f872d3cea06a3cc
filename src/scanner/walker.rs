use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ReaperError, Result};

/// What a walked entry turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with its apparent size in bytes
    File { size: u64 },
    /// Directory
    Directory,
    /// Symbolic link; never followed
    Symlink,
    /// FIFO, socket or device node; never counted as file content
    Other,
}

/// A single entry produced by [`walk`].
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full path to the entry
    pub path: PathBuf,
    /// Depth below the walked root (the root itself is 0)
    pub depth: usize,
    pub kind: EntryKind,
}

/// Order in which a walk yields entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Parents before children. Fine when only totals matter.
    #[default]
    Any,
    /// Every child is yielded before its parent directory.
    ContentsFirst,
}

/// Lazy iterator over the entries below a root.
///
/// Errors on individual entries are yielded in place and do not end the walk.
pub struct Walker {
    inner: walkdir::IntoIter,
}

/// Drop trailing separators and `.` components.
///
/// `link/` resolves through the link when stat'ed, `link` does not.
pub fn normalize_root(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Walk `root` without following any symbolic link, the root included.
pub fn walk(root: &Path, order: Order) -> Walker {
    let inner = WalkDir::new(normalize_root(root))
        .follow_links(false)
        .follow_root_links(false)
        .contents_first(order == Order::ContentsFirst)
        .into_iter();

    Walker { inner }
}

impl Iterator for Walker {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(e) => e,
            Err(err) => return Some(Err(ReaperError::from_walk(err))),
        };

        let file_type = entry.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if !file_type.is_file() {
            EntryKind::Other
        } else {
            // lstat data; the file may have vanished since the directory was read
            match entry.metadata() {
                Ok(metadata) => EntryKind::File {
                    size: metadata.len(),
                },
                Err(err) => return Some(Err(ReaperError::from_walk(err))),
            }
        };

        let depth = entry.depth();
        Some(Ok(Entry {
            path: entry.into_path(),
            depth,
            kind,
        }))
    }
}

/// Refuse to operate on `path` when it is itself a symbolic link.
///
/// A missing path is not an error here; callers decide what absence means.
pub fn reject_symlink_root(path: &Path) -> Result<()> {
    match fs::symlink_metadata(normalize_root(path)) {
        Ok(meta) if meta.file_type().is_symlink() => {
            Err(ReaperError::SymlinkRejected(path.to_path_buf()))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReaperError::from_io(path, e)),
    }
}
