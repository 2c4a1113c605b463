//! Google OAuth for the Drive backend
//!
//! A cached, unexpired token is used as-is. Anything else is handed to
//! `yup-oauth2`'s device flow authenticator, which refreshes the token when
//! a refresh token is cached, or shows the user a verification URL and a
//! code and polls until they approve. The authenticator reads and writes
//! tokens through the connector's [`CredentialStore`].

use super::credentials::{CredentialStore, TokenCache};
use super::drive::{DriveClient, DRIVE_BASE_URL, DRIVE_ROOT_URL};
use super::StorageConnector;
use crate::error::{Result, SyncError};
use std::future::Future;
use std::pin::Pin;
use yup_oauth2::authenticator_delegate::{DeviceAuthResponse, DeviceFlowDelegate};
use yup_oauth2::{ApplicationSecret, DeviceFlowAuthenticator};

/// Scope limited to files this application creates or opens
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const DEVICE_CODE_URL: &str = "https://oauth2.googleapis.com/device/code";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// OAuth client registration used to request tokens
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    /// OAuth client identifier
    pub client_id: String,
    /// OAuth client secret (required by Google for installed-app clients)
    pub client_secret: Option<String>,
    /// Requested scope
    pub scope: String,
}

impl OAuthClientConfig {
    /// Configuration for `client_id` with the Drive file scope
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            scope: DRIVE_FILE_SCOPE.to_string(),
        }
    }

    /// Set the client secret
    #[must_use]
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }
}

/// URLs of the OAuth and Drive endpoints
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    /// Device authorization endpoint
    pub device_code_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Root of the Google APIs, uploads live below it
    pub drive_root_url: String,
    /// Drive metadata API
    pub drive_base_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            device_code_url: DEVICE_CODE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            drive_root_url: DRIVE_ROOT_URL.to_string(),
            drive_base_url: DRIVE_BASE_URL.to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Every endpoint rooted under `base` (for local test servers)
    #[must_use]
    pub fn under(base: &str) -> Self {
        Self {
            device_code_url: format!("{base}/device/code"),
            token_url: format!("{base}/token"),
            drive_root_url: format!("{base}/"),
            drive_base_url: format!("{base}/drive/v3/"),
        }
    }
}

/// Shows the device code on stderr, keeping stdout for reports
struct TerminalPrompt;

impl DeviceFlowDelegate for TerminalPrompt {
    fn present_user_code<'a>(
        &'a self,
        device_auth_resp: &'a DeviceAuthResponse,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            eprintln!();
            eprintln!("Google Drive authorization required");
            eprintln!("  1. Open {}", device_auth_resp.verification_uri);
            eprintln!("  2. Enter the code {}", device_auth_resp.user_code);
            eprintln!("Waiting for approval...");
        })
    }
}

/// Connector producing authenticated [`DriveClient`]s
#[derive(Debug, Clone)]
pub struct GoogleConnector<S: CredentialStore> {
    oauth: OAuthClientConfig,
    store: S,
    endpoints: GoogleEndpoints,
}

impl<S: CredentialStore + Clone + 'static> GoogleConnector<S> {
    /// Connector using the public Google endpoints
    pub fn new(oauth: OAuthClientConfig, store: S) -> Self {
        Self {
            oauth,
            store,
            endpoints: GoogleEndpoints::default(),
        }
    }

    /// Override the endpoints
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// The credential store in use
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Obtain an access token, from cache, refresh or device flow
    async fn access_token(&self) -> Result<String> {
        match self.store.load().await {
            Ok(Some(creds)) if !creds.is_expired() => {
                tracing::debug!("Using cached credentials");
                return Ok(creds.access_token);
            }
            Ok(Some(_)) => tracing::info!("Cached access token expired"),
            Ok(None) => tracing::debug!("No cached credentials"),
            Err(e) => tracing::warn!("Error loading credentials: {e}"),
        }

        self.require_client_id()?;

        // yup-oauth2 builds its HTTP client on the process-wide rustls provider
        if rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .is_ok()
        {
            tracing::trace!("Installed the aws-lc-rs crypto provider");
        }

        let authenticator = DeviceFlowAuthenticator::builder(self.application_secret())
            .device_code_url(self.endpoints.device_code_url.clone())
            .grant_type(DEVICE_GRANT_TYPE)
            .flow_delegate(Box::new(TerminalPrompt))
            .with_storage(Box::new(TokenCache::new(self.store.clone())))
            .build()
            .await
            .map_err(|e| SyncError::Auth(format!("Cannot set up OAuth client: {e}")))?;

        tracing::info!("Requesting access with scope: {}", self.oauth.scope);
        let token = authenticator
            .token(&[self.oauth.scope.as_str()])
            .await
            .map_err(|e| SyncError::Auth(e.to_string()))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| SyncError::Auth("Token endpoint returned no access token".to_string()))
    }

    /// Network flows need a registered client; cached tokens do not
    fn require_client_id(&self) -> Result<()> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(SyncError::Auth(
                "No OAuth client id configured (use --client-id or PDFSYNC_CLIENT_ID)".to_string(),
            ));
        }
        Ok(())
    }

    fn application_secret(&self) -> ApplicationSecret {
        ApplicationSecret {
            client_id: self.oauth.client_id.clone(),
            client_secret: self.oauth.client_secret.clone().unwrap_or_default(),
            token_uri: self.endpoints.token_url.clone(),
            auth_uri: AUTH_URL.to_string(),
            ..ApplicationSecret::default()
        }
    }
}

impl<S: CredentialStore + Clone + 'static> StorageConnector for GoogleConnector<S> {
    type Client = DriveClient;

    async fn authenticate(&self) -> Result<DriveClient> {
        tracing::info!("Authenticating with Google Drive");
        let access_token = self.access_token().await?;
        DriveClient::with_urls(
            access_token,
            self.endpoints.drive_root_url.clone(),
            self.endpoints.drive_base_url.clone(),
        )
    }
}
