//! Credential persistence between runs
//!
//! The connector asks a [`CredentialStore`] for a cached OAuth token before
//! starting any network flow. The same store backs `yup-oauth2`'s token
//! storage through [`TokenCache`], so refreshed and newly granted tokens
//! land in it too.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;
use yup_oauth2::storage::{TokenInfo, TokenStorage, TokenStorageError};

/// Seconds of validity below which a token is treated as expired
const EXPIRY_MARGIN_SECS: u64 = 60;

/// OAuth tokens as cached on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Bearer token for API calls
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry of `access_token` in seconds since the Unix epoch
    #[serde(default)]
    pub expires_at: Option<u64>,
}

impl StoredCredentials {
    /// Whether the access token is expired (or about to be) at `now`
    ///
    /// Tokens without a recorded expiry are assumed valid.
    #[must_use]
    pub const fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires_at) => now + EXPIRY_MARGIN_SECS >= expires_at,
            None => false,
        }
    }

    /// Whether the access token is expired right now
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    /// Convert a token handed out by `yup-oauth2`
    ///
    /// Returns `None` when the token carries no access token.
    #[must_use]
    pub fn from_token_info(token: TokenInfo) -> Option<Self> {
        Some(Self {
            access_token: token.access_token?,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_at
                .and_then(|at| u64::try_from(at.unix_timestamp()).ok()),
        })
    }

    /// The token in `yup-oauth2`'s representation
    #[must_use]
    pub fn to_token_info(&self) -> TokenInfo {
        TokenInfo {
            access_token: Some(self.access_token.clone()),
            refresh_token: self.refresh_token.clone(),
            expires_at: self
                .expires_at
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok()),
            id_token: None,
        }
    }
}

/// Current time in seconds since the Unix epoch
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Storage for cached credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load cached credentials, `Ok(None)` if nothing is cached
    ///
    /// # Errors
    ///
    /// Returns an error if the cache exists but cannot be read or parsed.
    async fn load(&self) -> Result<Option<StoredCredentials>>;

    /// Replace the cached credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be written.
    async fn save(&self, credentials: &StoredCredentials) -> Result<()>;
}

/// JSON file holding the cached credentials
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default cache location under the user's configuration directory
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pdfsync").join("credentials.json"))
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<StoredCredentials>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::from_io(&self.path, &e)),
        }
    }

    async fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::from_io(parent, &e))?;
        }
        let json = serde_json::to_vec_pretty(credentials)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| SyncError::from_io(&self.path, &e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| SyncError::from_io(&self.path, &e))?;
        }

        tracing::debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }
}

/// Credential cache kept in memory, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Mutex<Option<StoredCredentials>>>,
}

impl MemoryCredentialStore {
    /// Store pre-populated with `credentials`
    #[must_use]
    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(credentials))),
        }
    }

    /// Currently cached credentials
    #[must_use]
    pub fn current(&self) -> Option<StoredCredentials> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<StoredCredentials>> {
        Ok(self.current())
    }

    async fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(credentials.clone());
        Ok(())
    }
}

/// Exposes a [`CredentialStore`] as `yup-oauth2` token storage
///
/// The tool asks for a single scope, so one cached token serves every
/// scope set `yup-oauth2` asks about.
#[derive(Debug, Clone)]
pub struct TokenCache<S> {
    store: S,
}

impl<S: CredentialStore> TokenCache<S> {
    /// Wrap `store`
    pub const fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: CredentialStore> TokenStorage for TokenCache<S> {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> std::result::Result<(), TokenStorageError> {
        let Some(credentials) = StoredCredentials::from_token_info(token) else {
            tracing::debug!("Ignoring token without an access token");
            return Ok(());
        };
        self.store
            .save(&credentials)
            .await
            .map_err(|e| TokenStorageError::Other(e.to_string().into()))?;
        Ok(())
    }

    async fn get(&self, _target_scopes: &[&str]) -> Option<TokenInfo> {
        match self.store.load().await {
            Ok(cached) => cached.map(|credentials| credentials.to_token_info()),
            Err(e) => {
                tracing::warn!("Error loading credentials: {e}");
                None
            }
        }
    }
}
