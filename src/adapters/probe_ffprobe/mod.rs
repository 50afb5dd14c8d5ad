//! FFprobe adapter for media file probing
//!
//! Counts the streams of the primary video so the mux plan can place new
//! subtitle tracks after the kept ones.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapters::process::{run_with_timeout, tail_chars};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
}

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    program: PathBuf,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Count streams by type from ffprobe's JSON stream listing
    pub fn parse_streams(file_path: &Path, json: &str) -> Result<MediaInfo, DomainError> {
        let parsed: ProbeOutput = serde_json::from_str(json)
            .map_err(|e| DomainError::ProbeFailed(format!("unreadable ffprobe output: {}", e)))?;

        let count = |kind: &str| {
            parsed
                .streams
                .iter()
                .filter(|s| s.codec_type.as_deref() == Some(kind))
                .count()
        };

        Ok(MediaInfo {
            path: file_path.to_path_buf(),
            video_streams: count("video"),
            audio_streams: count("audio"),
            subtitle_streams: count("subtitle"),
        })
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        let args = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_entries"),
            OsStr::new("stream=codec_type"),
            OsStr::new("-of"),
            OsStr::new("json"),
            file_path.as_os_str(),
        ];

        let output = run_with_timeout(&self.program, args, PROBE_TIMEOUT)
            .await
            .map_err(|e| DomainError::ProbeFailed(format!("ffprobe {}", e)))?;

        if !output.success() {
            return Err(DomainError::ProbeFailed(format!(
                "cannot open {}: {}",
                file_path.display(),
                tail_chars(output.stderr.trim(), 500)
            )));
        }

        Self::parse_streams(file_path, &output.stdout)
    }
}
