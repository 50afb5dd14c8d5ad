//! Subtitle asset location and mux planning module

use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::errors::DomainError;

pub mod locator;
pub mod mux_plan;

pub use locator::SubtitleLocator;
pub use mux_plan::MuxPlanBuilder;

/// Stream category addressed by a map directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Video,
    Audio,
    Subtitle,
}

impl StreamType {
    fn specifier(&self) -> &'static str {
        match self {
            StreamType::Video => "v",
            StreamType::Audio => "a",
            StreamType::Subtitle => "s",
        }
    }
}

/// Route all streams of one type from one input to the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamMap {
    pub input_index: usize,
    pub stream_type: StreamType,
    /// Absent streams are not an error
    pub optional: bool,
}

impl StreamMap {
    pub fn required(input_index: usize, stream_type: StreamType) -> Self {
        Self {
            input_index,
            stream_type,
            optional: false,
        }
    }

    pub fn optional(input_index: usize, stream_type: StreamType) -> Self {
        Self {
            input_index,
            stream_type,
            optional: true,
        }
    }

    /// ffmpeg `-map` argument, e.g. `0:s?`
    pub fn specifier(&self) -> String {
        format!(
            "{}:{}{}",
            self.input_index,
            self.stream_type.specifier(),
            if self.optional { "?" } else { "" }
        )
    }
}

/// Tags for one output subtitle stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleMetadata {
    /// Position among the output subtitle streams
    pub output_index: usize,
    pub language: String,
    pub title: String,
}

/// Ordered multiplexing plan consumed by the muxer.
///
/// Input 0 is always the primary video. Every stream is codec-copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MuxPlan {
    pub inputs: Vec<PathBuf>,
    pub maps: Vec<StreamMap>,
    pub subtitle_metadata: Vec<SubtitleMetadata>,
    pub output: PathBuf,
}

impl MuxPlan {
    /// Number of external subtitle files attached by this plan
    pub fn added_subtitle_inputs(&self) -> usize {
        self.inputs.len().saturating_sub(1)
    }

    /// Check that maps reference declared inputs and metadata indices are unique
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.inputs.is_empty() {
            return Err(DomainError::InvalidPlan("plan has no inputs".to_string()));
        }

        if let Some(map) = self.maps.iter().find(|m| m.input_index >= self.inputs.len()) {
            return Err(DomainError::InvalidPlan(format!(
                "map {} references undeclared input",
                map.specifier()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for meta in &self.subtitle_metadata {
            if !seen.insert(meta.output_index) {
                return Err(DomainError::InvalidPlan(format!(
                    "duplicate metadata for output subtitle stream {}",
                    meta.output_index
                )));
            }
        }

        if self.inputs.iter().any(|input| input == &self.output) {
            return Err(DomainError::InvalidPlan(
                "output path must differ from every input".to_string(),
            ));
        }

        Ok(())
    }

    /// Render as ffmpeg arguments:
    /// inputs, maps, metadata, codec copy, output.
    pub fn to_ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-nostdin".into()];

        for input in &self.inputs {
            args.push("-i".into());
            args.push(input.as_os_str().to_owned());
        }

        for map in &self.maps {
            args.push("-map".into());
            args.push(map.specifier().into());
        }

        for meta in &self.subtitle_metadata {
            let key = format!("-metadata:s:s:{}", meta.output_index);
            args.push(key.clone().into());
            args.push(format!("language={}", meta.language).into());
            args.push(key.into());
            args.push(format!("title={}", meta.title).into());
        }

        for codec in ["-c:v", "-c:a", "-c:s"] {
            args.push(codec.into());
            args.push("copy".into());
        }

        args.push("-y".into());
        args.push(self.output.as_os_str().to_owned());
        args
    }
}
