//! Structured results returned by `stage` and `publish`
//!
//! Reports are plain data so any front end (the CLI, a service endpoint, a
//! form) can render them. They serialize to JSON for `--json` output.

use crate::remote::FolderId;
use serde::Serialize;
use std::fmt;

/// A file that could not be processed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    /// Entry name (basename only)
    pub name: String,
    /// Human-readable failure reason
    pub reason: String,
}

impl FailedFile {
    /// Record a failure for `name`
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of a staging pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Names of files relocated into the destination
    pub moved: Vec<String>,
    /// Files that could not be relocated
    pub failed: Vec<FailedFile>,
}

impl StageReport {
    /// Overall status of this pass
    #[must_use]
    pub fn status(&self) -> RunStatus {
        RunStatus::from_failures(self.failed.len())
    }
}

/// Outcome of a publishing pass that reached the remote folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Folder the files were published into
    pub folder_id: FolderId,
    /// Titles whose remote content was replaced
    pub updated: Vec<String>,
    /// Titles created as new remote files
    pub created: Vec<String>,
    /// Files whose upload failed
    pub failed: Vec<FailedFile>,
}

impl PublishReport {
    /// Empty report for `folder_id`
    #[must_use]
    pub const fn new(folder_id: FolderId) -> Self {
        Self {
            folder_id,
            updated: Vec::new(),
            created: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Overall status of this pass
    #[must_use]
    pub fn status(&self) -> RunStatus {
        RunStatus::from_failures(self.failed.len())
    }
}

/// Result of `publish`: either a no-op or a completed pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// The destination held no matching files; nothing was contacted
    NothingToUpload,
    /// Files were reconciled against the remote folder
    Completed(PublishReport),
}

impl PublishOutcome {
    /// Overall status of this pass
    #[must_use]
    pub fn status(&self) -> RunStatus {
        match self {
            Self::NothingToUpload => RunStatus::Success,
            Self::Completed(report) => report.status(),
        }
    }

    /// The report, if the pass reached the remote folder
    #[must_use]
    pub const fn report(&self) -> Option<&PublishReport> {
        match self {
            Self::NothingToUpload => None,
            Self::Completed(report) => Some(report),
        }
    }
}

/// Overall status communicated through the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every selected file was processed (or there was nothing to do)
    Success,
    /// Some files failed, the rest were processed
    PartialFailure,
    /// The call was aborted (missing directory, authentication failure)
    Failure,
}

impl RunStatus {
    /// Derive the status of a completed batch from its failure count
    ///
    /// A batch in which every file failed is still a partial failure: the
    /// call itself completed and produced a report.
    #[must_use]
    pub const fn from_failures(failed: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else {
            Self::PartialFailure
        }
    }

    /// Process exit code for this status
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::PartialFailure => 1,
            Self::Failure => 2,
        }
    }
}

fn write_failures(f: &mut fmt::Formatter<'_>, failed: &[FailedFile]) -> fmt::Result {
    for failure in failed {
        writeln!(f, "  failed: {} ({})", failure.name, failure.reason)?;
    }
    Ok(())
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Staged {} file(s), {} failure(s)",
            self.moved.len(),
            self.failed.len()
        )?;
        for name in &self.moved {
            writeln!(f, "  moved: {name}")?;
        }
        write_failures(f, &self.failed)
    }
}

impl fmt::Display for PublishReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Published to folder {}: {} created, {} updated, {} failure(s)",
            self.folder_id,
            self.created.len(),
            self.updated.len(),
            self.failed.len()
        )?;
        for name in &self.created {
            writeln!(f, "  created: {name}")?;
        }
        for name in &self.updated {
            writeln!(f, "  updated: {name}")?;
        }
        write_failures(f, &self.failed)
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToUpload => writeln!(f, "Nothing to upload"),
            Self::Completed(report) => report.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Success.exit_code(), 0);
        assert_eq!(RunStatus::PartialFailure.exit_code(), 1);
        assert_eq!(RunStatus::Failure.exit_code(), 2);
    }

    #[test]
    fn test_empty_stage_report_is_success() {
        assert_eq!(StageReport::default().status(), RunStatus::Success);
    }

    #[test]
    fn test_publish_report_with_failure_is_partial() {
        let mut report = PublishReport::new(FolderId::new("folder-1"));
        report.created.push("a.pdf".to_string());
        report.failed.push(FailedFile::new("b.pdf", "quota exceeded"));
        assert_eq!(report.status(), RunStatus::PartialFailure);
        assert_eq!(
            PublishOutcome::Completed(report).status(),
            RunStatus::PartialFailure
        );
    }

    #[test]
    fn test_nothing_to_upload_serializes_with_tag() {
        let json = serde_json::to_value(PublishOutcome::NothingToUpload).unwrap();
        assert_eq!(json["outcome"], "nothing_to_upload");
    }

    #[test]
    fn test_display_lists_failures() {
        let report = StageReport {
            moved: vec!["a.pdf".to_string()],
            failed: vec![FailedFile::new("b.pdf", "Permission denied")],
        };
        let text = report.to_string();
        assert!(text.contains("moved: a.pdf"));
        assert!(text.contains("failed: b.pdf (Permission denied)"));
    }
}
