//! Publisher: reconcile a local folder's files with one remote folder
//!
//! Per call the publisher moves through these states:
//!
//! ```text
//! Idle -> Authenticating -> FolderResolved -> (Querying -> Updating | Creating)* -> Done
//!              |
//!              +--> Failed(Auth)
//! ```
//!
//! A failure while authenticating aborts the call. A failure on one file is
//! recorded in the report and the loop moves on to the next file.

use crate::error::{Result, SyncError};
use crate::filter::{list_matching, FileRecord, SuffixFilter};
use crate::remote::{FolderId, RemoteFolder, RemoteStorage, StorageConnector};
use crate::report::{FailedFile, PublishOutcome, PublishReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Display name of the folder created when no identifier is supplied
pub const DEFAULT_FOLDER_NAME: &str = "PDF_Files";

/// Options for a publishing pass
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Which local files to publish
    pub filter: SuffixFilter,
    /// Name given to a newly created remote folder
    pub folder_name: String,
    /// Show a progress bar on stderr
    pub progress: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            filter: SuffixFilter::default(),
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            progress: false,
        }
    }
}

/// States of a publishing call, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    /// Nothing started yet
    Idle,
    /// Waiting for an authenticated client
    Authenticating,
    /// Target folder known
    FolderResolved,
    /// Looking up a title in the folder
    Querying,
    /// Replacing an existing file's content
    Updating,
    /// Creating a new remote file
    Creating,
    /// All files processed
    Done,
    /// Aborted
    Failed,
}

/// How a single file was reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reconciled {
    Updated,
    Created,
}

fn transition(state: &mut PublishState, next: PublishState, subject: &str) {
    tracing::debug!("{state:?} -> {next:?} ({subject})");
    *state = next;
}

/// Publish every matching file of `destination_dir` to the remote folder
///
/// When `folder_id` is `None` a new folder named `options.folder_name` is
/// created; the identifier is not remembered, so each such call creates
/// another folder. A supplied identifier is used as-is without checking
/// that it exists.
///
/// If the directory holds no matching files, returns
/// [`PublishOutcome::NothingToUpload`] without authenticating or making any
/// remote call.
///
/// # Errors
///
/// Returns `Err(SyncError)` if:
/// - `destination_dir` does not exist or cannot be read
/// - authentication fails (`SyncError::Auth`)
/// - a new folder cannot be created
pub async fn publish<C: StorageConnector>(
    connector: &C,
    destination_dir: &Path,
    folder_id: Option<FolderId>,
    options: &PublishOptions,
) -> Result<PublishOutcome> {
    let mut state = PublishState::Idle;
    let subject = destination_dir.display().to_string();

    let files = list_matching(destination_dir, &options.filter).await?;
    if files.is_empty() {
        tracing::info!(
            "No {} files found in {} to upload",
            options.filter.suffix(),
            destination_dir.display()
        );
        return Ok(PublishOutcome::NothingToUpload);
    }

    transition(&mut state, PublishState::Authenticating, &subject);
    let client = match connector.authenticate().await {
        Ok(client) => client,
        Err(e) => {
            transition(&mut state, PublishState::Failed, &subject);
            let e = match e {
                SyncError::Auth(_) => e,
                other => SyncError::Auth(other.to_string()),
            };
            tracing::error!("{e}");
            return Err(e);
        }
    };
    tracing::info!("Authenticated with {}", client.name());

    let folder = match resolve_folder(&client, folder_id, &options.folder_name).await {
        Ok(folder) => folder,
        Err(e) => {
            transition(&mut state, PublishState::Failed, &subject);
            return Err(e);
        }
    };
    transition(&mut state, PublishState::FolderResolved, folder.id.as_str());

    let mut report = PublishReport::new(folder.id.clone());
    let progress = progress_bar(options.progress, files.len());

    for record in &files {
        progress.set_message(record.name.clone());
        tracing::info!("Preparing to upload: {}", record.name);

        match reconcile(&client, &folder.id, record, &mut state).await {
            Ok(Reconciled::Updated) => {
                tracing::info!("Updated: {}", record.name);
                report.updated.push(record.name.clone());
            }
            Ok(Reconciled::Created) => {
                tracing::info!("Uploaded: {}", record.name);
                report.created.push(record.name.clone());
            }
            Err(e) => {
                tracing::warn!("Error uploading {}: {e}", record.name);
                report.failed.push(FailedFile::new(record.name.clone(), e));
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    transition(&mut state, PublishState::Done, folder.id.as_str());
    Ok(PublishOutcome::Completed(report))
}

/// Use the supplied folder or create a fresh one
async fn resolve_folder<R: RemoteStorage>(
    client: &R,
    folder_id: Option<FolderId>,
    folder_name: &str,
) -> Result<RemoteFolder> {
    if let Some(id) = folder_id {
        tracing::debug!("Using supplied folder {id}");
        return Ok(RemoteFolder {
            id,
            display_name: None,
        });
    }

    let id = client.create_folder(folder_name).await?;
    tracing::info!("Created new folder {folder_name:?} with ID: {id}");
    Ok(RemoteFolder {
        id,
        display_name: Some(folder_name.to_string()),
    })
}

/// Update the same-titled remote file, or create one
async fn reconcile<R: RemoteStorage>(
    client: &R,
    folder: &FolderId,
    record: &FileRecord,
    state: &mut PublishState,
) -> Result<Reconciled> {
    let content = tokio::fs::read(&record.local_path)
        .await
        .map_err(|e| SyncError::from_io(&record.local_path, &e))?;

    transition(state, PublishState::Querying, &record.name);
    let existing = client.query_files_by_title(folder, &record.name).await?;
    if existing.len() > 1 {
        tracing::warn!(
            "Ambiguous match: {} remote files titled {:?} in folder {folder}, updating the first",
            existing.len(),
            record.name
        );
    }

    if let Some(remote) = existing.into_iter().next() {
        transition(state, PublishState::Updating, &record.name);
        client.update_file_content(&remote, content).await?;
        Ok(Reconciled::Updated)
    } else {
        transition(state, PublishState::Creating, &record.name);
        client.create_file(folder, &record.name, content).await?;
        Ok(Reconciled::Created)
    }
}

fn progress_bar(enabled: bool, len: usize) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    bar
}
