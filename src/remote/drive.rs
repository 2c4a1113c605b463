//! Google Drive backend
//!
//! Wraps `google-drive3`'s [`DriveHub`]:
//! - folders are created with a metadata-only `files.create`
//! - title queries go through `files.list`
//! - new files and content updates use multipart uploads

use super::{FolderId, RemoteFile, RemoteStorage};
use crate::error::{Result, SyncError};
use google_drive3::api::{File, Scope};
use google_drive3::DriveHub;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use std::fmt;
use std::io::Cursor;

/// Root URL of the Google APIs (uploads live below it)
pub const DRIVE_ROOT_URL: &str = "https://www.googleapis.com/";
/// Base URL of the Drive v3 metadata API
pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3/";
/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

type Connector = HttpsConnector<HttpConnector>;

/// Authenticated Drive API client
pub struct DriveClient {
    hub: DriveHub<Connector>,
}

impl fmt::Debug for DriveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveClient").finish_non_exhaustive()
    }
}

impl DriveClient {
    /// Client using `access_token` against the public Drive endpoints
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RemoteOperation` if the TLS setup fails.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_urls(access_token, DRIVE_ROOT_URL, DRIVE_BASE_URL)
    }

    /// Client using `access_token` against the given root and base URLs
    ///
    /// Both URLs must end with `/`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RemoteOperation` if the TLS setup fails.
    pub fn with_urls(
        access_token: impl Into<String>,
        root_url: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::aws_lc_rs::default_provider())
            .map_err(|e| SyncError::RemoteOperation(format!("TLS setup failed: {e}")))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
            .build(connector);

        let mut hub = DriveHub::new(client, access_token.into());
        hub.root_url(root_url.into());
        hub.base_url(base_url.into());
        Ok(Self { hub })
    }
}

/// Escape a value for use inside a single-quoted Drive query string
#[must_use]
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Drive search expression selecting live files titled `title` in `folder`
#[must_use]
pub fn title_query(folder: &FolderId, title: &str) -> String {
    format!(
        "'{}' in parents and name = '{}' and trashed = false",
        escape_query_value(folder.as_str()),
        escape_query_value(title)
    )
}

/// Content type sent with an upload, guessed from the title
#[must_use]
pub fn mime_for(title: &str) -> mime::Mime {
    if title.to_lowercase().ends_with(".pdf") {
        mime::APPLICATION_PDF
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}

fn remote_error(what: &str, err: &google_drive3::Error) -> SyncError {
    SyncError::RemoteOperation(format!("{what} failed: {err}"))
}

impl RemoteStorage for DriveClient {
    async fn create_folder(&self, name: &str) -> Result<FolderId> {
        let folder = File {
            name: Some(name.to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            ..File::default()
        };
        let (_, created) = self
            .hub
            .files()
            .create(folder)
            .param("fields", "id")
            .add_scope(Scope::File)
            .doit_without_upload()
            .await
            .map_err(|e| remote_error("Folder creation", &e))?;

        created.id.map(FolderId::new).ok_or_else(|| {
            SyncError::RemoteOperation("Folder creation returned no id".to_string())
        })
    }

    async fn query_files_by_title(&self, folder: &FolderId, title: &str) -> Result<Vec<RemoteFile>> {
        let query = title_query(folder, title);
        tracing::trace!("Drive query: {query}");
        let (_, list) = self
            .hub
            .files()
            .list()
            .q(&query)
            .param("fields", "files(id,name)")
            .add_scope(Scope::File)
            .doit()
            .await
            .map_err(|e| remote_error("File query", &e))?;

        Ok(list
            .files
            .unwrap_or_default()
            .into_iter()
            .filter_map(|file| {
                Some(RemoteFile {
                    id: file.id?,
                    title: file.name.unwrap_or_else(|| title.to_string()),
                    parent: folder.clone(),
                })
            })
            .collect())
    }

    async fn create_file(&self, folder: &FolderId, title: &str, content: Vec<u8>) -> Result<RemoteFile> {
        let metadata = File {
            name: Some(title.to_string()),
            parents: Some(vec![folder.as_str().to_string()]),
            ..File::default()
        };
        let (_, created) = self
            .hub
            .files()
            .create(metadata)
            .param("fields", "id,name")
            .add_scope(Scope::File)
            .upload(Cursor::new(content), mime_for(title))
            .await
            .map_err(|e| remote_error("Upload", &e))?;

        let id = created
            .id
            .ok_or_else(|| SyncError::RemoteOperation("Upload returned no file id".to_string()))?;
        Ok(RemoteFile {
            id,
            title: title.to_string(),
            parent: folder.clone(),
        })
    }

    async fn update_file_content(&self, file: &RemoteFile, content: Vec<u8>) -> Result<()> {
        self.hub
            .files()
            .update(File::default(), &file.id)
            .add_scope(Scope::File)
            .upload(Cursor::new(content), mime_for(&file.title))
            .await
            .map_err(|e| remote_error("Content update", &e))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "google-drive"
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn client_for(server: &MockServer) -> DriveClient {
        DriveClient::with_urls(
            "token-123",
            format!("{}/", server.base_url()),
            format!("{}/drive/v3/", server.base_url()),
        )
        .unwrap()
    }

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("plain.pdf"), "plain.pdf");
        assert_eq!(escape_query_value("it's.pdf"), "it\\'s.pdf");
        assert_eq!(escape_query_value("a\\b.pdf"), "a\\\\b.pdf");
    }

    #[test]
    fn test_title_query() {
        let query = title_query(&FolderId::new("abc"), "o'neil.pdf");
        assert_eq!(
            query,
            "'abc' in parents and name = 'o\\'neil.pdf' and trashed = false"
        );
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("report.pdf"), mime::APPLICATION_PDF);
        assert_eq!(mime_for("REPORT.PDF"), mime::APPLICATION_PDF);
        assert_eq!(mime_for("notes.txt"), mime::APPLICATION_OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_create_folder() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/drive/v3/files")
                .header("authorization", "Bearer token-123")
                .body_includes(FOLDER_MIME_TYPE);
            then.status(200).json_body(json!({ "id": "folder-9" }));
        });

        let id = client_for(&server).create_folder("PDF_Files").await.unwrap();
        mock.assert();
        assert_eq!(id, FolderId::new("folder-9"));
    }

    #[tokio::test]
    async fn test_query_files_by_title() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/drive/v3/files")
                .query_param("q", "'f1' in parents and name = 'a.pdf' and trashed = false");
            then.status(200)
                .json_body(json!({ "files": [{ "id": "x1", "name": "a.pdf" }] }));
        });

        let files = client_for(&server)
            .query_files_by_title(&FolderId::new("f1"), "a.pdf")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "x1");
        assert_eq!(files[0].parent, FolderId::new("f1"));
    }

    #[tokio::test]
    async fn test_create_file_uses_multipart_upload() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/upload/drive/v3/files")
                .query_param("uploadType", "multipart")
                .body_includes("%PDF-1.4");
            then.status(200).json_body(json!({ "id": "new-1", "name": "a.pdf" }));
        });

        let file = client_for(&server)
            .create_file(&FolderId::new("f1"), "a.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();
        mock.assert();
        assert_eq!(file.id, "new-1");
        assert_eq!(file.title, "a.pdf");
    }

    #[tokio::test]
    async fn test_update_file_content() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/upload/drive/v3/files/x1");
            then.status(200).json_body(json!({ "id": "x1" }));
        });

        let file = RemoteFile {
            id: "x1".to_string(),
            title: "a.pdf".to_string(),
            parent: FolderId::new("f1"),
        };
        client_for(&server)
            .update_file_content(&file, b"%PDF-1.5".to_vec())
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_error_status_maps_to_remote_operation() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/drive/v3/files");
            then.status(403).json_body(json!({
                "error": { "code": 403, "message": "storageQuotaExceeded" }
            }));
        });

        let err = client_for(&server)
            .query_files_by_title(&FolderId::new("f1"), "a.pdf")
            .await
            .unwrap_err();
        match err {
            SyncError::RemoteOperation(message) => assert!(message.starts_with("File query failed")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
