//! Error types for staging and publishing
//!
//! Directory-level and authentication failures abort a whole call and are
//! returned as `Err(SyncError)`. Per-file failures never escape: they are
//! converted to report entries via [`SyncError::to_string`].

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias used throughout the library
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors produced by the stager, the publisher and the remote backends
#[derive(Error, Debug)]
pub enum SyncError {
    /// A directory the call depends on does not exist
    #[error("Directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Access to a file or directory was refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Authentication with the storage provider failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A remote call (query, create, update) failed
    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    /// Any other local filesystem failure
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    /// Invalid configuration or arguments
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Classify an I/O error raised while reading a directory the call depends on
    #[must_use]
    pub fn from_dir_io(dir: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(dir.to_path_buf()),
            _ => Self::from_io(dir, err),
        }
    }

    /// Classify an I/O error raised while touching a single file
    ///
    /// A vanished file is an ordinary per-file failure, not a missing directory.
    #[must_use]
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(format!("{}: {err}", path.display()))
            }
            _ => Self::FileSystem(format!("{}: {err}", path.display())),
        }
    }

    /// Whether this error aborts the whole call rather than a single file
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Auth(_) | Self::Config(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::FileSystem(format!("Invalid JSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let mapped = SyncError::from_dir_io(Path::new("/tmp/missing"), &err);
        assert!(matches!(mapped, SyncError::NotFound(ref p) if p == Path::new("/tmp/missing")));
        assert!(mapped.is_fatal());
    }

    #[test]
    fn test_missing_file_is_per_file() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let mapped = SyncError::from_io(Path::new("/tmp/dest/x.pdf"), &err);
        assert!(matches!(mapped, SyncError::FileSystem(_)));
        assert!(!mapped.is_fatal());
        assert!(!mapped.to_string().contains("Directory not found"));
        assert!(mapped.to_string().contains("x.pdf"));
    }

    #[test]
    fn test_from_io_permission_denied_is_per_file() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let mapped = SyncError::from_io(Path::new("a.pdf"), &err);
        assert!(matches!(mapped, SyncError::PermissionDenied(_)));
        assert!(!mapped.is_fatal());
        assert!(mapped.to_string().contains("a.pdf"));
    }

    #[test]
    fn test_from_io_other_kinds() {
        let err = io::Error::other("disk on fire");
        let mapped = SyncError::from_io(Path::new("b.pdf"), &err);
        assert!(matches!(mapped, SyncError::FileSystem(_)));
    }

    #[test]
    fn test_auth_is_fatal() {
        assert!(SyncError::Auth("expired".to_string()).is_fatal());
        assert!(!SyncError::RemoteOperation("quota".to_string()).is_fatal());
    }
}
