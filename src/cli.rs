//! Command-line interface definitions
//!
//! Arguments are grouped by the component that consumes them, so the same
//! groups can be filled in by another front end.

use crate::filter::{SuffixFilter, DEFAULT_SUFFIX};
use crate::publish::{PublishOptions, DEFAULT_FOLDER_NAME};
use crate::remote::FolderId;
use crate::stage::{StageOptions, StagingRequest};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Move PDF files into a folder and publish them to Google Drive
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// What to do
    #[command(subcommand)]
    pub command: Command,

    /// File selection
    #[command(flatten)]
    pub filter: FilterConfig,

    /// Output and logging configuration
    #[command(flatten)]
    pub output: OutputConfig,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Move matching files from SOURCE into DESTINATION
    Stage {
        #[command(flatten)]
        paths: PathConfig,
    },
    /// Upload matching files in DESTINATION to a Drive folder
    Publish {
        /// Directory whose files are uploaded
        #[arg(value_name = "DESTINATION")]
        destination: PathBuf,

        #[command(flatten)]
        remote: RemoteConfig,
    },
    /// Stage, then publish the destination
    Run {
        #[command(flatten)]
        paths: PathConfig,

        #[command(flatten)]
        remote: RemoteConfig,
    },
}

/// Paths configuration
///
/// Used by: `stage()`
#[derive(clap::Args, Debug, Clone)]
pub struct PathConfig {
    /// Directory scanned for files to move
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory the files are moved into (created if missing)
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,
}

impl PathConfig {
    /// Staging request for these paths
    #[must_use]
    pub fn to_request(&self) -> StagingRequest {
        StagingRequest::new(&self.source, &self.destination)
    }
}

/// File selection
///
/// Used by: `list_matching()`, via both stager and publisher
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Selection Options")]
pub struct FilterConfig {
    /// File name suffix to select
    #[arg(long, default_value = DEFAULT_SUFFIX, global = true)]
    pub suffix: String,

    /// Match the suffix regardless of case (e.g. also select `.PDF`)
    #[arg(long, global = true)]
    pub ignore_case: bool,
}

impl FilterConfig {
    /// Build the suffix filter
    #[must_use]
    pub fn to_filter(&self) -> SuffixFilter {
        SuffixFilter::new(self.suffix.clone(), !self.ignore_case)
    }
}

/// Remote folder and OAuth configuration
///
/// Used by: `GoogleConnector::new()`, `publish()`
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Drive Options")]
pub struct RemoteConfig {
    /// Existing Drive folder to publish into (a new folder is created otherwise)
    #[arg(long, env = "PDFSYNC_FOLDER_ID")]
    pub folder_id: Option<String>,

    /// Name of the folder created when --folder-id is not given
    #[arg(long, default_value = DEFAULT_FOLDER_NAME)]
    pub folder_name: String,

    /// Credential cache file (default: user config dir)
    #[arg(long, env = "PDFSYNC_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// OAuth client id
    #[arg(long, env = "PDFSYNC_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "PDFSYNC_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

impl RemoteConfig {
    /// Supplied folder identifier, if any
    #[must_use]
    pub fn folder(&self) -> Option<FolderId> {
        self.folder_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(FolderId::new)
    }
}

/// Output and logging configuration
///
/// Used by: `main()`, logging initialization, report rendering
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Output Options")]
pub struct OutputConfig {
    /// Show what would be moved or uploaded without touching anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Show a progress bar while uploading
    #[arg(long, global = true)]
    pub progress: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl OutputConfig {
    /// Default log filter for the chosen verbosity
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Both --quiet and --verbose options are used
    /// - The suffix is empty
    /// - The folder name is empty
    ///
    /// A missing OAuth client id is not an error here: a cached token is
    /// enough, and the connector reports it when a network flow is needed.
    pub fn validate(&self) -> Result<()> {
        if self.output.quiet && self.output.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        if self.filter.suffix.is_empty() {
            anyhow::bail!("Suffix must not be empty");
        }

        if let Some(remote) = self.remote() {
            if remote.folder_name.trim().is_empty() {
                anyhow::bail!("Folder name must not be empty");
            }
        }

        Ok(())
    }

    /// Remote configuration, for commands that publish
    #[must_use]
    pub const fn remote(&self) -> Option<&RemoteConfig> {
        match &self.command {
            Command::Stage { .. } => None,
            Command::Publish { remote, .. } | Command::Run { remote, .. } => Some(remote),
        }
    }

    /// Stager options from the selection and output groups
    #[must_use]
    pub fn stage_options(&self) -> StageOptions {
        StageOptions {
            filter: self.filter.to_filter(),
            dry_run: self.output.dry_run,
        }
    }

    /// Publisher options, for commands that publish
    #[must_use]
    pub fn publish_options(&self) -> Option<PublishOptions> {
        self.remote().map(|remote| PublishOptions {
            filter: self.filter.to_filter(),
            folder_name: remote.folder_name.clone(),
            progress: self.output.progress && !self.output.quiet,
        })
    }
}
