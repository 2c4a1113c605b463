//! # pdfsync
//!
//! Move PDF files from a source folder into a staging folder, then publish
//! the staging folder to Google Drive.
//!
//! The two steps are independent and share nothing but the destination
//! directory on disk:
//!
//! - [`stage()`] relocates matching files and returns a [`StageReport`]
//! - [`publish()`] reconciles the destination's files with one remote folder
//!   (update same-titled files, create the rest) and returns a
//!   [`PublishOutcome`]
//!
//! The remote side is reached through [`remote::StorageConnector`] and
//! [`remote::RemoteStorage`], so the same logic runs against Google Drive or
//! the in-memory [`remote::MemoryStorage`].

pub mod cli;
pub mod commands;
pub mod error;
pub mod filter;
pub mod publish;
pub mod remote;
pub mod report;
pub mod stage;

pub use error::{Result, SyncError};
pub use filter::{FileRecord, SuffixFilter};
pub use publish::{publish, PublishOptions, PublishState};
pub use report::{FailedFile, PublishOutcome, PublishReport, RunStatus, StageReport};
pub use stage::{stage, StageOptions, StagingRequest};
