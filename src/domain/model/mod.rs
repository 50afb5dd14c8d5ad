// Domain models - Core types and data structures

use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::errors::DomainError;

/// Episode number of one installment of the series, always within [1, 1132].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u16")]
pub struct EpisodeId(u16);

impl EpisodeId {
    /// First episode of the series
    pub const FIRST: u16 = 1;
    /// Last episode covered by the archive
    pub const LAST: u16 = 1132;

    /// Create an episode id, rejecting numbers outside the series
    pub fn new(number: u32) -> Result<Self, DomainError> {
        if (Self::FIRST as u32..=Self::LAST as u32).contains(&number) {
            Ok(Self(number as u16))
        } else {
            Err(DomainError::InvalidEpisode(number))
        }
    }

    /// Raw episode number
    pub fn get(self) -> u16 {
        self.0
    }

    /// Zero-padded four digit form used in every filename
    pub fn padded(self) -> String {
        format!("{:04}", self.0)
    }

    /// Whether this episode falls inside `range`
    pub fn within(self, range: &RangeInclusive<u16>) -> bool {
        range.contains(&self.0)
    }
}

impl TryFrom<u32> for EpisodeId {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EpisodeId> for u16 {
    fn from(ep: EpisodeId) -> Self {
        ep.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Release family that produced a video file, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    EraiRaws,
    ReghostFabre,
    Crunchyroll,
    FabreRemastered,
    Fabre,
    Bilibili,
    Unknown,
}

impl SourceTag {
    /// Stable identifier used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::EraiRaws => "erai_raws",
            SourceTag::ReghostFabre => "reghost_fabre",
            SourceTag::Crunchyroll => "crunchyroll",
            SourceTag::FabreRemastered => "fabre_remastered",
            SourceTag::Fabre => "fabre",
            SourceTag::Bilibili => "bilibili",
            SourceTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External subtitle asset family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleKind {
    /// Fan translation, one `.ass` per episode
    Fan,
    /// BB translation shipped alongside the Netflix remaster, `.srt`
    Bb,
}

impl SubtitleKind {
    /// Episodes for which an asset of this kind can exist
    pub fn valid_range(&self) -> RangeInclusive<u16> {
        match self {
            SubtitleKind::Fan => 1..=757,
            SubtitleKind::Bb => 124..=753,
        }
    }

    /// File extension of the asset (and of its synced sidecar)
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleKind::Fan => "ass",
            SubtitleKind::Bb => "srt",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleKind::Fan => "fan",
            SubtitleKind::Bb => "bb",
        }
    }
}

impl fmt::Display for SubtitleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming/resolution tag forced by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Derive from the source tag
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "remastered")]
    Remastered,
    #[serde(rename = "480p")]
    Sd480,
}

/// Why an episode is not muxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Release already ships final subtitles
    EmbeddedSubs,
    /// Operator flagged the episode as dubbed
    Dubbed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmbeddedSubs => f.write_str("embedded subs"),
            SkipReason::Dubbed => f.write_str("dubbed"),
        }
    }
}

/// Numeric episode band with its own default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EpisodeRange {
    #[serde(rename = "episodes_1_123")]
    Early,
    #[serde(rename = "episodes_124_753")]
    Middle,
    #[serde(rename = "episodes_754_1132")]
    Late,
}

impl EpisodeRange {
    /// Every range, in ascending order
    pub const ALL: [EpisodeRange; 3] = [EpisodeRange::Early, EpisodeRange::Middle, EpisodeRange::Late];

    /// Range containing `ep`
    pub fn of(ep: EpisodeId) -> Self {
        match ep.get() {
            1..=123 => EpisodeRange::Early,
            124..=753 => EpisodeRange::Middle,
            _ => EpisodeRange::Late,
        }
    }

    pub fn bounds(&self) -> RangeInclusive<u16> {
        match self {
            EpisodeRange::Early => 1..=123,
            EpisodeRange::Middle => 124..=753,
            EpisodeRange::Late => 754..=EpisodeId::LAST,
        }
    }

    /// Configuration key for overrides of this range
    pub fn key(&self) -> &'static str {
        match self {
            EpisodeRange::Early => "episodes_1_123",
            EpisodeRange::Middle => "episodes_124_753",
            EpisodeRange::Late => "episodes_754_1132",
        }
    }
}

impl FromStr for EpisodeRange {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "episodes_1_123" => Ok(EpisodeRange::Early),
            "episodes_124_753" | "episodes_124_723" => Ok(EpisodeRange::Middle),
            "episodes_754_1132" => Ok(EpisodeRange::Late),
            "episodes_724_753" => Err(
                "`episodes_724_753` is not a separate range: override `episodes_124_753` \
                 instead (the BB track relabel for 724-753 is always applied)"
                    .to_string(),
            ),
            other => Err(format!(
                "unknown key `{}`, expected one of `episodes_1_123`, `episodes_124_753`, \
                 `episodes_754_1132`",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for EpisodeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for EpisodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolved processing decisions for one episode.
///
/// Also the shape of a range override in the configuration file. Fields an
/// override leaves out fall back to the permissive [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodePolicy {
    /// Set when no mux happens at all; a rename may still apply
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub skip: Option<SkipReason>,
    /// Only normalize the filename
    pub rename_only: bool,
    /// Carry previously embedded subtitle tracks into the output
    pub keep_existing_subs: bool,
    /// Relabel the first kept embedded track as the BB translation
    pub rename_existing_bb_track: bool,
    pub add_fan_subs: bool,
    pub add_bb_subs: bool,
    pub output_format: OutputFormat,
}

impl Default for EpisodePolicy {
    fn default() -> Self {
        Self {
            skip: None,
            rename_only: false,
            keep_existing_subs: true,
            rename_existing_bb_track: false,
            add_fan_subs: true,
            add_bb_subs: true,
            output_format: OutputFormat::Default,
        }
    }
}

impl EpisodePolicy {
    /// Full subtitle processing with the given track choices
    pub fn mux(keep_existing_subs: bool, add_fan_subs: bool, add_bb_subs: bool) -> Self {
        Self {
            skip: None,
            rename_only: false,
            keep_existing_subs,
            rename_existing_bb_track: false,
            add_fan_subs,
            add_bb_subs,
            output_format: OutputFormat::Default,
        }
    }

    /// Filename normalization only, existing tracks untouched
    pub fn rename_only(output_format: OutputFormat) -> Self {
        Self {
            skip: None,
            rename_only: true,
            keep_existing_subs: true,
            rename_existing_bb_track: false,
            add_fan_subs: false,
            add_bb_subs: false,
            output_format,
        }
    }

    /// No subtitle work; the caller still applies the canonical name
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            skip: Some(reason),
            ..Self::rename_only(OutputFormat::Default)
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skip.is_some()
    }

    /// Whether the episode ends up as a pure rename
    pub fn is_rename_only(&self) -> bool {
        self.rename_only || self.is_skipped()
    }

    /// Whether any external subtitle kind should be located
    pub fn wants(&self, kind: SubtitleKind) -> bool {
        match kind {
            SubtitleKind::Fan => self.add_fan_subs,
            SubtitleKind::Bb => self.add_bb_subs,
        }
    }
}

/// Stream layout of a probed video file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub video_streams: usize,
    pub audio_streams: usize,
    pub subtitle_streams: usize,
}
