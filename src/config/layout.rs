//! Directory layout and external tool resolution

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::DirectoryConfig;
use crate::error::{ArchiveError, ArchiveResult};

/// Absolute directories used by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    pub base_dir: PathBuf,
    pub shows_dir: PathBuf,
    pub fan_subs_dir: PathBuf,
    pub bb_subs_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub backup_dir: PathBuf,
}

impl DirectoryLayout {
    /// Resolve configured directories against the base directory
    pub fn resolve(config: &DirectoryConfig, cwd: &Path) -> Self {
        let base_dir = config.base_dir_or(cwd);
        let under_base = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };

        Self {
            shows_dir: under_base(&config.shows_dir),
            fan_subs_dir: under_base(&config.fan_subs_dir),
            bb_subs_dir: under_base(&config.bb_subs_dir),
            temp_dir: under_base(&config.temp_dir),
            backup_dir: base_dir.join("backups"),
            base_dir,
        }
    }

    /// Create the temp directory if absent
    pub fn ensure_temp_dir(&self) -> ArchiveResult<()> {
        std::fs::create_dir_all(&self.temp_dir)?;
        Ok(())
    }

    /// Check the directories a batch run cannot do without.
    ///
    /// The BB subtitle directory is optional; its absence only warns.
    pub fn validate(&self) -> ArchiveResult<()> {
        let required = [
            ("shows_dir", &self.shows_dir),
            ("fan_subs_dir", &self.fan_subs_dir),
        ];
        for (name, path) in required {
            if !path.is_dir() {
                return Err(ArchiveError::MissingDirectory {
                    name,
                    path: path.clone(),
                });
            }
        }

        if !self.bb_subs_dir.is_dir() {
            warn!(path = %self.bb_subs_dir.display(), "Optional directory not found: bb_subs_dir");
        }

        Ok(())
    }

    pub fn log_summary(&self) {
        info!("Directory configuration:");
        info!("  Base dir:     {}", self.base_dir.display());
        info!("  Shows dir:    {}", self.shows_dir.display());
        info!("  Fan subs dir: {}", self.fan_subs_dir.display());
        info!("  BB subs dir:  {}", self.bb_subs_dir.display());
        info!("  Temp dir:     {}", self.temp_dir.display());
    }
}

/// Executables for the external collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub ffsubsync: PathBuf,
}

impl ToolPaths {
    /// Prefer binaries inside `ffmpeg_dir` when it holds them, else `PATH`
    pub fn resolve(ffmpeg_dir: Option<&Path>) -> Self {
        let exe = |name: &str| format!("{}{}", name, std::env::consts::EXE_SUFFIX);

        let (ffmpeg, ffprobe) = match ffmpeg_dir {
            Some(dir) if dir.join(exe("ffmpeg")).is_file() => {
                (dir.join(exe("ffmpeg")), dir.join(exe("ffprobe")))
            }
            Some(dir) => {
                warn!(dir = %dir.display(), "ffmpeg not found in configured ffmpeg_dir, using PATH");
                (PathBuf::from(exe("ffmpeg")), PathBuf::from(exe("ffprobe")))
            }
            None => (PathBuf::from(exe("ffmpeg")), PathBuf::from(exe("ffprobe"))),
        };

        Self {
            ffmpeg,
            ffprobe,
            ffsubsync: PathBuf::from(exe("ffs")),
        }
    }
}
