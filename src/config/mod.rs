//! Configuration model
//!
//! [`AppConfig`] is the single configuration value threaded through the
//! container into every interactor. Every field has a default, so a config
//! file only needs to name what it changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::model::EpisodeId;
use crate::domain::rules::{OutputNamer, PolicyOverrides};
use crate::error::{ArchiveError, ArchiveResult};

pub mod layout;

pub use layout::{DirectoryLayout, ToolPaths};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rename dubbed episodes without touching their tracks
    pub skip_dubbed_episodes: bool,
    pub dubbed_episodes: BTreeSet<EpisodeId>,
    pub subtitle_labels: SubtitleLabels,
    pub directories: DirectoryConfig,
    pub naming: NamingConfig,
    /// Range name -> replacement policy
    pub policy_overrides: PolicyOverrides,
    /// Range overrides written at the top level of the file. Any other
    /// unrecognized top-level key lands here and fails the load.
    #[serde(flatten, skip_serializing_if = "PolicyOverrides::is_empty")]
    pub range_overrides: PolicyOverrides,
    /// Seconds
    pub ffsubsync_timeout: u64,
    /// Seconds
    pub ffmpeg_timeout: u64,
    pub create_backups: bool,
    pub cleanup_temp_files: bool,
    /// Replace existing files at the canonical output path
    pub overwrite_existing: bool,
    pub log_level: String,
    pub log_file: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            skip_dubbed_episodes: false,
            dubbed_episodes: BTreeSet::new(),
            subtitle_labels: SubtitleLabels::default(),
            directories: DirectoryConfig::default(),
            naming: NamingConfig::default(),
            policy_overrides: PolicyOverrides::new(),
            range_overrides: PolicyOverrides::new(),
            ffsubsync_timeout: 45,
            ffmpeg_timeout: 300,
            create_backups: false,
            cleanup_temp_files: true,
            overwrite_existing: false,
            log_level: "INFO".to_string(),
            log_file: "detective_conan_processing.log".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.ffsubsync_timeout)
    }

    pub fn mux_timeout(&self) -> Duration {
        Duration::from_secs(self.ffmpeg_timeout)
    }

    /// Namer configured with the series name and container extension
    pub fn output_namer(&self) -> OutputNamer {
        OutputNamer::new(&self.naming.series_name, &self.naming.extension)
    }

    /// Every range override, whichever place in the file it was written
    pub fn effective_overrides(&self) -> PolicyOverrides {
        let mut merged = self.range_overrides.clone();
        merged.extend(
            self.policy_overrides
                .iter()
                .map(|(range, policy)| (*range, policy.clone())),
        );
        merged
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> ArchiveResult<()> {
        if let Some(range) = self
            .range_overrides
            .keys()
            .find(|range| self.policy_overrides.contains_key(range))
        {
            return Err(ArchiveError::InvalidConfig(format!(
                "{} is overridden both at the top level and under policy_overrides",
                range
            )));
        }
        if self.ffsubsync_timeout == 0 {
            return Err(ArchiveError::InvalidConfig(
                "ffsubsync_timeout must be greater than zero".to_string(),
            ));
        }
        if self.ffmpeg_timeout == 0 {
            return Err(ArchiveError::InvalidConfig(
                "ffmpeg_timeout must be greater than zero".to_string(),
            ));
        }
        if self.naming.series_name.trim().is_empty() {
            return Err(ArchiveError::InvalidConfig(
                "naming.series_name cannot be empty".to_string(),
            ));
        }
        if self.naming.extension.trim_start_matches('.').is_empty() {
            return Err(ArchiveError::InvalidConfig(
                "naming.extension cannot be empty".to_string(),
            ));
        }
        if self.naming.video_extensions.is_empty() {
            return Err(ArchiveError::InvalidConfig(
                "naming.video_extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }
}

/// Titles written into the subtitle track metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleLabels {
    pub fan_subs: String,
    pub bb_subs: String,
}

impl Default for SubtitleLabels {
    fn default() -> Self {
        Self {
            fan_subs: "Fan Subs [English]".to_string(),
            bb_subs: "BB Subs [English]".to_string(),
        }
    }
}

/// Directory settings as written in the config file.
///
/// Relative paths are resolved against `base_dir` by [`DirectoryLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Defaults to the working directory
    pub base_dir: Option<PathBuf>,
    pub shows_dir: PathBuf,
    pub fan_subs_dir: PathBuf,
    pub bb_subs_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub ffmpeg_dir: Option<PathBuf>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            shows_dir: PathBuf::from("Shows"),
            fan_subs_dir: PathBuf::from("fan subs 0001-0757"),
            bb_subs_dir: PathBuf::from(
                "[Fabre-RAW] Detective Conan Remastered [NetflixJP] [1080p]",
            ),
            temp_dir: PathBuf::from("temp_processing"),
            ffmpeg_dir: None,
        }
    }
}

impl DirectoryConfig {
    /// Base directory, falling back to `cwd`
    pub fn base_dir_or(&self, cwd: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        }
    }
}

/// Output naming and video discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub series_name: String,
    /// Extension of the muxed output container
    pub extension: String,
    /// Extensions enumerated inside season directories
    pub video_extensions: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            series_name: "Detective Conan".to_string(),
            extension: "mkv".to_string(),
            video_extensions: vec!["mkv".to_string()],
        }
    }
}

/// Log line format for console and file output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
