use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum ReaperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Cannot operate on a symbolic link: {0}")]
    SymlinkRejected(PathBuf),

    #[error("Partial deletion of '{path}': {failed} entries could not be removed")]
    PartialDeletion { path: PathBuf, failed: u64 },

    #[error("Storage failure at path '{path}': {source}")]
    StorageFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

impl ReaperError {
    /// Classify an I/O error raised while operating on `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if is_storage_failure(&source) {
            return ReaperError::StorageFailure {
                path: path.to_path_buf(),
                source,
            };
        }

        match source.kind() {
            io::ErrorKind::NotFound => ReaperError::PathNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ReaperError::PermissionDenied(path.to_path_buf()),
            _ => ReaperError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Classify an error yielded by a directory walk.
    pub fn from_walk(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        match err.into_io_error() {
            Some(source) => Self::from_io(&path, source),
            None => ReaperError::Io {
                path,
                source: io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
            },
        }
    }

    /// Errors that must abort a whole batch rather than a single entry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReaperError::StorageFailure { .. })
    }
}

/// EIO and EROFS mean the medium itself is unusable; nothing after this will succeed.
fn is_storage_failure(err: &io::Error) -> bool {
    use nix::errno::Errno;

    matches!(
        err.raw_os_error().map(Errno::from_raw),
        Some(Errno::EIO) | Some(Errno::EROFS)
    )
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ReaperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ConfigError::Invalid("progress_interval must be > 0".into());
        assert!(err.to_string().contains("progress_interval"));

        let err = ReaperError::SymlinkRejected(PathBuf::from("/tmp/link"));
        assert!(err.to_string().contains("symbolic link"));
    }

    #[test]
    fn error_conversion() {
        let config_err = ConfigError::Invalid("test".into());
        let reaper_err: ReaperError = config_err.into();
        assert!(matches!(reaper_err, ReaperError::Config(_)));
    }

    #[test]
    fn classifies_io_kinds() {
        let path = Path::new("/x");

        let err = ReaperError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ReaperError::PathNotFound(_)));

        let err = ReaperError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ReaperError::PermissionDenied(_)));

        let err = ReaperError::from_io(path, io::Error::new(io::ErrorKind::Other, "busy"));
        assert!(matches!(err, ReaperError::Io { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn eio_is_fatal() {
        let source = io::Error::from_raw_os_error(nix::errno::Errno::EIO as i32);
        let err = ReaperError::from_io(Path::new("/disk"), source);
        assert!(matches!(err, ReaperError::StorageFailure { .. }));
        assert!(err.is_fatal());
    }
}
