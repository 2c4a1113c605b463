//! Remote storage abstraction
//!
//! The publisher only needs five operations from a storage provider:
//! authenticate, create a folder, query a folder for files by exact title,
//! create a file and replace a file's content. They are split over two
//! traits so that an authenticated client can only be obtained through
//! [`StorageConnector::authenticate`].
//!
//! Backends:
//! - [`drive`]: Google Drive through `google-drive3`
//! - [`memory`]: in-process fake used by tests

pub mod auth;
pub mod credentials;
pub mod drive;
pub mod memory;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export main types for convenience
pub use auth::{GoogleConnector, OAuthClientConfig};
pub use credentials::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials, TokenCache,
};
pub use drive::DriveClient;
pub use memory::{MemoryConnector, MemoryStorage};

/// Opaque identifier of a remote folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    /// Wrap a provider-assigned identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote folder the publisher writes into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    /// Provider identifier
    pub id: FolderId,
    /// Display name, when known (`None` for caller-supplied identifiers)
    pub display_name: Option<String>,
}

/// Handle to a file owned by the storage provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Provider identifier of the file
    pub id: String,
    /// Title the file is matched by
    pub title: String,
    /// Folder the file lives in
    pub parent: FolderId,
}

/// Operations on an authenticated storage account
///
/// Every call blocks the caller until the provider answers; the publisher
/// issues them strictly one after another.
pub trait RemoteStorage {
    /// Create a folder named `name` and return its identifier
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RemoteOperation` if the provider rejects the call.
    async fn create_folder(&self, name: &str) -> Result<FolderId>;

    /// Find files in `folder` whose title equals `title` exactly
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RemoteOperation` if the query fails.
    async fn query_files_by_title(&self, folder: &FolderId, title: &str) -> Result<Vec<RemoteFile>>;

    /// Create a file titled `title` inside `folder` with `content`
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RemoteOperation` if the upload fails.
    async fn create_file(&self, folder: &FolderId, title: &str, content: Vec<u8>) -> Result<RemoteFile>;

    /// Replace the content of an existing file
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RemoteOperation` if the upload fails.
    async fn update_file_content(&self, file: &RemoteFile, content: Vec<u8>) -> Result<()>;

    /// Backend name for log messages
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Produces authenticated [`RemoteStorage`] clients
///
/// Credential caching between runs is the connector's business; the
/// publisher only asks for a ready client.
pub trait StorageConnector {
    /// Client type handed out after authentication
    type Client: RemoteStorage;

    /// Authenticate and return a client
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Auth` if no valid credentials can be obtained.
    async fn authenticate(&self) -> Result<Self::Client>;
}

/// Connector built on first [`StorageConnector::authenticate`] call
///
/// Lets a caller defer setup that may fail (such as locating a credential
/// cache) until a remote call is actually needed.
pub struct LazyConnector<F> {
    build: F,
}

impl<F> LazyConnector<F> {
    /// Wrap a connector factory
    pub const fn new(build: F) -> Self {
        Self { build }
    }
}

impl<F, C> StorageConnector for LazyConnector<F>
where
    F: Fn() -> Result<C>,
    C: StorageConnector,
{
    type Client = C::Client;

    async fn authenticate(&self) -> Result<C::Client> {
        (self.build)()?.authenticate().await
    }
}
