//! Subtitle asset lookup

use std::ops::RangeInclusive;
use std::path::PathBuf;

use tracing::debug;

use crate::config::DirectoryLayout;
use crate::domain::model::{EpisodeId, SubtitleKind};

/// BB episodes published under the "Remastered" filename variant
pub const BB_REMASTERED_VARIANT: RangeInclusive<u16> = 124..=173;

/// Maps (episode, subtitle kind) to an asset on disk
#[derive(Debug, Clone)]
pub struct SubtitleLocator {
    fan_root: PathBuf,
    bb_root: PathBuf,
}

impl SubtitleLocator {
    pub fn new(layout: &DirectoryLayout) -> Self {
        Self::with_roots(layout.fan_subs_dir.clone(), layout.bb_subs_dir.clone())
    }

    pub fn with_roots(fan_root: impl Into<PathBuf>, bb_root: impl Into<PathBuf>) -> Self {
        Self {
            fan_root: fan_root.into(),
            bb_root: bb_root.into(),
        }
    }

    /// Asset filename, or `None` when the episode is outside the kind's range
    pub fn file_name(ep: EpisodeId, kind: SubtitleKind) -> Option<String> {
        if !ep.within(&kind.valid_range()) {
            return None;
        }

        let name = match kind {
            SubtitleKind::Fan => format!("{}.ass", ep.padded()),
            SubtitleKind::Bb if ep.within(&BB_REMASTERED_VARIANT) => format!(
                "[Fabre-RAW] Detective Conan Remastered {} [NetflixJP] [1080p].srt",
                ep.padded()
            ),
            SubtitleKind::Bb => format!(
                "[Fabre-RAW] Detective Conan {} [NetflixJP] [1080p].srt",
                ep.padded()
            ),
        };
        Some(name)
    }

    /// Where the asset would live, without checking that it exists
    pub fn candidate(&self, ep: EpisodeId, kind: SubtitleKind) -> Option<PathBuf> {
        let root = match kind {
            SubtitleKind::Fan => &self.fan_root,
            SubtitleKind::Bb => &self.bb_root,
        };
        Self::file_name(ep, kind).map(|name| root.join(name))
    }

    /// Existing asset path; `None` when out of range or missing on disk
    pub fn locate(&self, ep: EpisodeId, kind: SubtitleKind) -> Option<PathBuf> {
        let path = self.candidate(ep, kind)?;
        if path.is_file() {
            Some(path)
        } else {
            debug!(episode = ep.get(), kind = %kind, path = %path.display(), "subtitle asset not on disk");
            None
        }
    }
}
