//! Command execution for the CLI
//!
//! Each subcommand calls the library entry points and renders their reports.
//! Reports go to stdout (as text or JSON); logs go to stderr.

use crate::cli::{Args, Command, OutputConfig, RemoteConfig};
use crate::error::SyncError;
use crate::filter::{has_any_entry, list_matching};
use crate::publish::{publish, PublishOptions};
use crate::remote::{
    FileCredentialStore, FolderId, GoogleConnector, LazyConnector, OAuthClientConfig,
    StorageConnector,
};
use crate::report::{PublishOutcome, RunStatus, StageReport};
use crate::stage::{stage, StagingRequest};
use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

/// Run the parsed command line and return the overall status
///
/// # Errors
///
/// Returns an error when a call aborts: missing source or destination
/// directory, authentication failure, or folder creation failure.
pub async fn execute(args: &Args) -> Result<RunStatus> {
    match &args.command {
        Command::Stage { paths } => {
            let report = stage_step(args, &paths.to_request()).await?;
            emit(&args.output, &json!(report), &report.to_string())?;
            Ok(report.status())
        }
        Command::Publish {
            destination,
            remote,
        } => {
            if args.output.dry_run {
                return preview_publish(args, destination).await;
            }
            let connector = LazyConnector::new(|| google_connector(remote));
            let outcome = publish_step(args, &connector, destination, remote.folder()).await?;
            emit(&args.output, &json!(outcome), &outcome.to_string())?;
            Ok(outcome.status())
        }
        Command::Run { paths, remote } => {
            let request = paths.to_request();
            let staged = stage_step(args, &request).await?;

            if args.output.dry_run {
                let text = format!("{staged}Dry run: upload skipped\n");
                emit(&args.output, &json!({ "stage": staged }), &text)?;
                return Ok(staged.status());
            }

            if !has_any_entry(&request.destination_path).await? {
                let text = format!(
                    "{staged}No files found in {}. Please check the source directory and try again.\n",
                    request.destination_path.display()
                );
                emit(&args.output, &json!({ "stage": staged }), &text)?;
                return Ok(staged.status());
            }

            let connector = LazyConnector::new(|| google_connector(remote));
            let outcome =
                publish_step(args, &connector, &request.destination_path, remote.folder()).await?;
            let text = format!("{staged}{outcome}");
            emit(
                &args.output,
                &json!({ "stage": staged, "publish": outcome }),
                &text,
            )?;
            Ok(staged.status().max(outcome.status()))
        }
    }
}

async fn stage_step(args: &Args, request: &StagingRequest) -> Result<StageReport> {
    stage(request, &args.stage_options())
        .await
        .with_context(|| format!("Staging from {} failed", request.source_path.display()))
}

async fn publish_step<C: StorageConnector>(
    args: &Args,
    connector: &C,
    destination: &Path,
    folder_id: Option<FolderId>,
) -> Result<PublishOutcome> {
    let options = args.publish_options().unwrap_or_else(PublishOptions::default);
    publish(connector, destination, folder_id, &options)
        .await
        .with_context(|| format!("Publishing {} failed", destination.display()))
}

/// List what `publish` would upload, without authenticating
async fn preview_publish(args: &Args, destination: &Path) -> Result<RunStatus> {
    let files = list_matching(destination, &args.filter.to_filter())
        .await
        .with_context(|| format!("Publishing {} failed", destination.display()))?;
    let names: Vec<String> = files.into_iter().map(|file| file.name).collect();

    let mut text: String = names
        .iter()
        .map(|name| format!("would upload: {name}\n"))
        .collect();
    text.push_str("Dry run: upload skipped\n");
    emit(&args.output, &json!({ "would_upload": names }), &text)?;
    Ok(RunStatus::Success)
}

/// Build the Drive connector from the remote configuration
///
/// # Errors
///
/// Returns `SyncError::Config` if no credential cache location can be
/// determined.
pub fn google_connector(
    remote: &RemoteConfig,
) -> crate::error::Result<GoogleConnector<FileCredentialStore>> {
    let path = match &remote.credentials {
        Some(path) => path.clone(),
        None => FileCredentialStore::default_path().ok_or_else(|| {
            SyncError::Config(
                "Cannot determine a credential cache location; pass --credentials".to_string(),
            )
        })?,
    };

    let mut oauth = OAuthClientConfig::new(remote.client_id.clone().unwrap_or_default());
    if let Some(secret) = &remote.client_secret {
        oauth = oauth.with_client_secret(secret.clone());
    }

    Ok(GoogleConnector::new(oauth, FileCredentialStore::new(path)))
}

/// Print a report as JSON or text according to the output settings
fn emit(output: &OutputConfig, value: &serde_json::Value, text: &str) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else if !output.quiet {
        print!("{text}");
    }
    Ok(())
}
