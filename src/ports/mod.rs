// Ports - Interface definitions for the external collaborators

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::planner::MuxPlan;

/// Port for opening the primary video and counting its streams
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file; failure means the file cannot be muxed
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError>;
}

/// Outcome of one subtitle synchronization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Timing adjusted to the video
    Synced,
    /// Synchronizer failed or timed out; the input was copied verbatim
    NotSynced { reason: String },
}

impl SyncStatus {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncStatus::Synced)
    }
}

/// Port for the subtitle synchronizer
#[async_trait]
pub trait SyncPort: Send + Sync {
    /// Write a synchronized copy of `subtitle_in` to `subtitle_out`.
    ///
    /// Synchronizer failures degrade to a verbatim copy and are reported
    /// through [`SyncStatus::NotSynced`]; an error means not even the copy
    /// could be written.
    async fn sync_subtitle(
        &self,
        video: &Path,
        subtitle_in: &Path,
        subtitle_out: &Path,
    ) -> Result<SyncStatus, DomainError>;
}

/// Result of a successful mux
#[derive(Debug, Clone)]
pub struct MuxReport {
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// Port for the stream multiplexer
#[async_trait]
pub trait MuxPort: Send + Sync {
    /// Execute a plan into `plan.output`. Never touches the plan's inputs.
    async fn mux(&self, plan: &MuxPlan) -> Result<MuxReport, DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if file exists
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError>;

    /// Create directory (including parent directories)
    async fn create_directory(&self, dir_path: &Path) -> Result<(), DomainError>;

    /// Copy file
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), DomainError>;

    /// Delete file
    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError>;

    /// Move `from` onto `to`, replacing any existing file at `to`
    async fn replace_file(&self, from: &Path, to: &Path) -> Result<(), DomainError>;

    /// Subdirectories of `shows_dir` whose name contains `Season`, sorted by name
    async fn list_season_dirs(&self, shows_dir: &Path) -> Result<Vec<PathBuf>, DomainError>;

    /// Files directly inside `dir` with one of `extensions` (case-insensitive)
    async fn list_videos(&self, dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, DomainError>;

    /// Delete every regular file inside `dir`, returning how many were removed
    async fn clear_directory(&self, dir: &Path) -> Result<usize, DomainError>;
}
