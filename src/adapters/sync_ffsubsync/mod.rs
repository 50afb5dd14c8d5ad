//! ffsubsync adapter
//!
//! Runs `ffs <video> -i <subtitle> -o <output>`. Any failure falls back to a
//! verbatim copy so the episode can still be muxed with unsynced timing.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::adapters::process::{head_chars, run_with_timeout};
use crate::domain::errors::*;
use crate::ports::*;

/// ffsubsync-based synchronizer
pub struct FfsubsyncAdapter {
    program: PathBuf,
    timeout: Duration,
}

impl FfsubsyncAdapter {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn copy_unsynced(
        subtitle_in: &Path,
        subtitle_out: &Path,
        reason: String,
    ) -> Result<SyncStatus, DomainError> {
        tokio::fs::copy(subtitle_in, subtitle_out).await.map_err(|e| {
            DomainError::SyncFailed(format!(
                "{} (fallback copy to {} failed: {})",
                reason,
                subtitle_out.display(),
                e
            ))
        })?;
        Ok(SyncStatus::NotSynced { reason })
    }
}

#[async_trait]
impl SyncPort for FfsubsyncAdapter {
    async fn sync_subtitle(
        &self,
        video: &Path,
        subtitle_in: &Path,
        subtitle_out: &Path,
    ) -> Result<SyncStatus, DomainError> {
        info!(subtitle = %subtitle_in.display(), "Syncing subtitle");

        let args = [
            video.as_os_str(),
            OsStr::new("-i"),
            subtitle_in.as_os_str(),
            OsStr::new("-o"),
            subtitle_out.as_os_str(),
        ];

        let reason = match run_with_timeout(&self.program, args, self.timeout).await {
            Ok(output) if output.success() && subtitle_out.is_file() => {
                info!(output = %subtitle_out.display(), "Successfully synced");
                return Ok(SyncStatus::Synced);
            }
            Ok(output) if output.success() => "synchronizer produced no output file".to_string(),
            Ok(output) => format!(
                "exit status {}: {}",
                output.status,
                head_chars(output.stderr.trim(), 200)
            ),
            Err(e) => e.to_string(),
        };

        warn!(subtitle = %subtitle_in.display(), %reason, "FFSubSync failed, using original subtitle");
        Self::copy_unsynced(subtitle_in, subtitle_out, reason).await
    }
}
