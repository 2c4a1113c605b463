//! Suffix filtering and non-recursive directory listing
//!
//! Both the stager and the publisher select their inputs the same way: the
//! direct entries of one directory whose names end with a configured suffix.

use crate::error::{Result, SyncError};
use std::path::{Path, PathBuf};

/// Default suffix selecting PDF documents
pub const DEFAULT_SUFFIX: &str = ".pdf";

/// Name-suffix filter applied to directory entries
///
/// Matching is case-sensitive by default, so `REPORT.PDF` is not selected
/// unless the filter is built with `case_sensitive = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixFilter {
    suffix: String,
    case_sensitive: bool,
}

impl SuffixFilter {
    /// Create a filter for `suffix`
    #[must_use]
    pub fn new(suffix: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            suffix: suffix.into(),
            case_sensitive,
        }
    }

    /// The suffix this filter selects
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether matching distinguishes upper and lower case
    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Check whether a file name is selected by this filter
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if self.case_sensitive {
            name.ends_with(&self.suffix)
        } else {
            name.to_lowercase().ends_with(&self.suffix.to_lowercase())
        }
    }
}

impl Default for SuffixFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX, true)
    }
}

/// A directory entry selected by a [`SuffixFilter`]
///
/// Only lives for the duration of one scan-and-process pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Entry name (basename only)
    pub name: String,
    /// Full path of the entry
    pub local_path: PathBuf,
}

/// List the direct entries of `dir` whose names match `filter`
///
/// Entries are returned sorted by name so that processing order is stable
/// between runs. Subdirectories are not descended into; an entry that is
/// itself a directory is still returned when its name matches, and the
/// caller's per-file handling decides what happens to it.
///
/// # Errors
///
/// Returns `Err(SyncError)` if:
/// - `dir` does not exist (`NotFound`)
/// - `dir` cannot be read (`PermissionDenied` or `FileSystem`)
pub async fn list_matching(dir: &Path, filter: &SuffixFilter) -> Result<Vec<FileRecord>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SyncError::from_dir_io(dir, &e))?;

    let mut records = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SyncError::from_dir_io(dir, &e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if filter.matches(&name) {
            records.push(FileRecord {
                name,
                local_path: entry.path(),
            });
        } else {
            tracing::trace!("Skipping {name}: does not end with {}", filter.suffix());
        }
    }

    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}

/// Check whether `dir` has any entries at all, matching or not
///
/// # Errors
///
/// Returns `Err(SyncError)` if the directory cannot be read.
pub async fn has_any_entry(dir: &Path) -> Result<bool> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| SyncError::from_dir_io(dir, &e))?;
    Ok(entries
        .next_entry()
        .await
        .map_err(|e| SyncError::from_dir_io(dir, &e))?
        .is_some())
}
