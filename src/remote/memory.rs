//! In-memory storage backend
//!
//! Simulates folder and file existence without any network access. Clones
//! share the same state, so a test can keep one handle for inspection while
//! the publisher uses another.

use super::{FolderId, RemoteFile, RemoteFolder, RemoteStorage, StorageConnector};
use crate::error::{Result, SyncError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct StoredFile {
    file: RemoteFile,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemoryState {
    folders: Vec<RemoteFolder>,
    files: Vec<StoredFile>,
    next_id: u64,
    failing_titles: HashSet<String>,
    remote_calls: u64,
    auth_calls: u64,
}

impl MemoryState {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn check_injected_failure(&self, title: &str) -> Result<()> {
        if self.failing_titles.contains(title) {
            return Err(SyncError::RemoteOperation(format!(
                "injected failure for {title}"
            )));
        }
        Ok(())
    }
}

/// Storage account held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// Create an empty account
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every remote operation touching `title` fail
    pub fn fail_title(&self, title: impl Into<String>) {
        self.lock().failing_titles.insert(title.into());
    }

    /// Seed a folder that already exists remotely
    pub fn insert_folder(&self, name: &str) -> FolderId {
        let mut state = self.lock();
        let id = FolderId::new(state.allocate_id("folder"));
        state.folders.push(RemoteFolder {
            id: id.clone(),
            display_name: Some(name.to_string()),
        });
        id
    }

    /// Seed a file that already exists remotely
    pub fn insert_file(&self, folder: &FolderId, title: &str, content: &[u8]) -> RemoteFile {
        let mut state = self.lock();
        let file = RemoteFile {
            id: state.allocate_id("file"),
            title: title.to_string(),
            parent: folder.clone(),
        };
        state.files.push(StoredFile {
            file: file.clone(),
            content: content.to_vec(),
        });
        file
    }

    /// All folders, in creation order
    #[must_use]
    pub fn folders(&self) -> Vec<RemoteFolder> {
        self.lock().folders.clone()
    }

    /// Titles of the files in `folder`, in creation order
    #[must_use]
    pub fn titles_in(&self, folder: &FolderId) -> Vec<String> {
        self.lock()
            .files
            .iter()
            .filter(|stored| &stored.file.parent == folder)
            .map(|stored| stored.file.title.clone())
            .collect()
    }

    /// Content of the first file titled `title` in `folder`
    #[must_use]
    pub fn content_of(&self, folder: &FolderId, title: &str) -> Option<Vec<u8>> {
        self.lock()
            .files
            .iter()
            .find(|stored| &stored.file.parent == folder && stored.file.title == title)
            .map(|stored| stored.content.clone())
    }

    /// Number of storage operations issued (authentication excluded)
    #[must_use]
    pub fn remote_calls(&self) -> u64 {
        self.lock().remote_calls
    }

    /// Number of authentication attempts
    #[must_use]
    pub fn auth_calls(&self) -> u64 {
        self.lock().auth_calls
    }
}

impl RemoteStorage for MemoryStorage {
    async fn create_folder(&self, name: &str) -> Result<FolderId> {
        let mut state = self.lock();
        state.remote_calls += 1;
        let id = FolderId::new(state.allocate_id("folder"));
        state.folders.push(RemoteFolder {
            id: id.clone(),
            display_name: Some(name.to_string()),
        });
        Ok(id)
    }

    async fn query_files_by_title(&self, folder: &FolderId, title: &str) -> Result<Vec<RemoteFile>> {
        let mut state = self.lock();
        state.remote_calls += 1;
        state.check_injected_failure(title)?;
        Ok(state
            .files
            .iter()
            .filter(|stored| &stored.file.parent == folder && stored.file.title == title)
            .map(|stored| stored.file.clone())
            .collect())
    }

    async fn create_file(&self, folder: &FolderId, title: &str, content: Vec<u8>) -> Result<RemoteFile> {
        let mut state = self.lock();
        state.remote_calls += 1;
        state.check_injected_failure(title)?;
        let file = RemoteFile {
            id: state.allocate_id("file"),
            title: title.to_string(),
            parent: folder.clone(),
        };
        state.files.push(StoredFile {
            file: file.clone(),
            content,
        });
        Ok(file)
    }

    async fn update_file_content(&self, file: &RemoteFile, content: Vec<u8>) -> Result<()> {
        let mut state = self.lock();
        state.remote_calls += 1;
        state.check_injected_failure(&file.title)?;
        let stored = state
            .files
            .iter_mut()
            .find(|stored| stored.file.id == file.id)
            .ok_or_else(|| SyncError::RemoteOperation(format!("File not found: {}", file.id)))?;
        stored.content = content;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Connector handing out clients over a shared [`MemoryStorage`]
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    storage: MemoryStorage,
    reject_auth: bool,
}

impl MemoryConnector {
    /// Connector whose clients operate on `storage`
    #[must_use]
    pub const fn new(storage: MemoryStorage) -> Self {
        Self {
            storage,
            reject_auth: false,
        }
    }

    /// Connector that refuses every authentication attempt
    #[must_use]
    pub const fn rejecting(storage: MemoryStorage) -> Self {
        Self {
            storage,
            reject_auth: true,
        }
    }
}

impl StorageConnector for MemoryConnector {
    type Client = MemoryStorage;

    async fn authenticate(&self) -> Result<MemoryStorage> {
        self.storage.lock().auth_calls += 1;
        if self.reject_auth {
            return Err(SyncError::Auth("credentials rejected".to_string()));
        }
        Ok(self.storage.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn test_query_matches_exact_title_in_folder_only() {
        let storage = MemoryStorage::new();
        let a = storage.insert_folder("A");
        let b = storage.insert_folder("B");
        storage.insert_file(&a, "report.pdf", b"1");
        storage.insert_file(&b, "report.pdf", b"2");

        let found = storage.query_files_by_title(&a, "report.pdf").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].parent, a);
        assert!(storage
            .query_files_by_title(&a, "Report.pdf")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_content() {
        let storage = MemoryStorage::new();
        let folder = storage.insert_folder("A");
        let file = storage.insert_file(&folder, "a.pdf", b"old");
        storage.update_file_content(&file, b"new".to_vec()).await.unwrap();
        assert_eq!(storage.content_of(&folder, "a.pdf").unwrap(), b"new");
        assert_eq!(storage.remote_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let storage = MemoryStorage::new();
        let folder = storage.insert_folder("A");
        storage.fail_title("bad.pdf");
        let err = storage
            .create_file(&folder, "bad.pdf", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteOperation(_)));
    }

    #[tokio::test]
    async fn test_rejecting_connector() {
        let storage = MemoryStorage::new();
        let connector = MemoryConnector::rejecting(storage.clone());
        assert!(matches!(
            connector.authenticate().await,
            Err(SyncError::Auth(_))
        ));
        assert_eq!(storage.auth_calls(), 1);
    }
}
