//! Stager: move matching files from a source folder into a destination folder
//!
//! Staging is a purely local operation. The destination directory on disk
//! is the only hand-off to the publisher.

use crate::error::{Result, SyncError};
use crate::filter::{list_matching, FileRecord, SuffixFilter};
use crate::report::{FailedFile, StageReport};
use std::io;
use std::path::{Path, PathBuf};

/// Source and destination of a staging pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRequest {
    /// Directory scanned for matching files; never created
    pub source_path: PathBuf,
    /// Directory receiving the files; created recursively if missing
    pub destination_path: PathBuf,
}

impl StagingRequest {
    /// Create a request moving files from `source` into `destination`
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source.into(),
            destination_path: destination.into(),
        }
    }
}

/// Options for a staging pass
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    /// Which entries to move
    pub filter: SuffixFilter,
    /// Report what would move without touching the filesystem
    pub dry_run: bool,
}

/// Move every matching entry of the source directory into the destination
///
/// Existing files of the same name at the destination are overwritten.
/// A failure on one file is recorded in the report and the remaining files
/// are still processed.
///
/// # Errors
///
/// Returns `Err(SyncError)` only for directory-level failures:
/// - the source directory does not exist (`NotFound`)
/// - the source directory cannot be read
/// - the destination directory cannot be created
pub async fn stage(request: &StagingRequest, options: &StageOptions) -> Result<StageReport> {
    let source = &request.source_path;
    let destination = &request.destination_path;

    tracing::info!(
        "Moving files from {} to {}",
        source.display(),
        destination.display()
    );

    let candidates = list_matching(source, &options.filter).await?;
    let mut report = StageReport::default();

    if options.dry_run {
        tracing::info!("Dry run: {} file(s) would be moved", candidates.len());
        report.moved = candidates.into_iter().map(|record| record.name).collect();
        return Ok(report);
    }

    ensure_directory(destination).await?;

    for record in candidates {
        let target = destination.join(&record.name);
        match relocate(&record, &target).await {
            Ok(()) => {
                tracing::info!("Moved: {}", record.name);
                report.moved.push(record.name);
            }
            Err(e) => {
                tracing::warn!("Error moving {}: {e}", record.name);
                report.failed.push(FailedFile::new(record.name, e));
            }
        }
    }

    tracing::debug!(
        "Staging finished: {} moved, {} failed",
        report.moved.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Create `dir` and its parents if it does not exist yet
async fn ensure_directory(dir: &Path) -> Result<()> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SyncError::FileSystem(format!(
            "Destination exists but is not a directory: {}",
            dir.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                SyncError::FileSystem(format!(
                    "Failed to create directory {}: {e}",
                    dir.display()
                ))
            })?;
            tracing::info!("Created directory {}", dir.display());
            Ok(())
        }
        Err(e) => Err(SyncError::from_dir_io(dir, &e)),
    }
}

/// Move one entry, falling back to copy-and-delete across filesystems
async fn relocate(record: &FileRecord, target: &Path) -> Result<()> {
    match tokio::fs::rename(&record.local_path, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                "{} is on another filesystem, copying instead of renaming",
                record.name
            );
            tokio::fs::copy(&record.local_path, target)
                .await
                .map_err(|e| SyncError::from_io(&record.local_path, &e))?;
            tokio::fs::remove_file(&record.local_path)
                .await
                .map_err(|e| SyncError::from_io(&record.local_path, &e))
        }
        Err(e) => Err(SyncError::from_io(&record.local_path, &e)),
    }
}
