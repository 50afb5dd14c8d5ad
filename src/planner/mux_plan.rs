//! Mux plan construction

use std::path::Path;

use tracing::debug;

use crate::config::SubtitleLabels;
use crate::domain::errors::DomainError;
use crate::domain::model::{EpisodePolicy, MediaInfo};
use crate::planner::{MuxPlan, StreamMap, StreamType, SubtitleMetadata};

/// Language tag written on every relabelled or added subtitle track
pub const SUBTITLE_LANGUAGE: &str = "eng";

/// Translates a policy plus located assets into a [`MuxPlan`]
#[derive(Debug, Clone)]
pub struct MuxPlanBuilder {
    labels: SubtitleLabels,
}

impl MuxPlanBuilder {
    pub fn new(labels: SubtitleLabels) -> Self {
        Self { labels }
    }

    /// Build the plan for one episode.
    ///
    /// Output subtitle order is kept embedded tracks, then fan, then bb.
    /// Kept tracks occupy indices `0..k` where `k` comes from the probe.
    pub fn build(
        &self,
        video: &MediaInfo,
        policy: &EpisodePolicy,
        fan_asset: Option<&Path>,
        bb_asset: Option<&Path>,
        output: &Path,
    ) -> Result<MuxPlan, DomainError> {
        if video.video_streams == 0 {
            return Err(DomainError::InvalidPlan(format!(
                "no video stream in {}",
                video.path.display()
            )));
        }

        let mut plan = MuxPlan {
            inputs: vec![video.path.clone()],
            maps: vec![
                StreamMap::required(0, StreamType::Video),
                StreamMap::required(0, StreamType::Audio),
            ],
            subtitle_metadata: Vec::new(),
            output: output.to_path_buf(),
        };

        let mut next_subtitle_index = 0;

        if policy.keep_existing_subs {
            plan.maps.push(StreamMap::optional(0, StreamType::Subtitle));

            if policy.rename_existing_bb_track && video.subtitle_streams > 0 {
                plan.subtitle_metadata.push(self.metadata(0, &self.labels.bb_subs));
            }
            next_subtitle_index = video.subtitle_streams;
        }

        let additions = [
            (fan_asset, policy.add_fan_subs, &self.labels.fan_subs),
            (bb_asset, policy.add_bb_subs, &self.labels.bb_subs),
        ];
        for (asset, wanted, label) in additions {
            let Some(path) = asset.filter(|_| wanted) else {
                continue;
            };
            let input_index = plan.inputs.len();
            plan.inputs.push(path.to_path_buf());
            plan.maps.push(StreamMap::required(input_index, StreamType::Subtitle));
            plan.subtitle_metadata.push(self.metadata(next_subtitle_index, label));
            next_subtitle_index += 1;
        }

        plan.validate()?;
        debug!(
            inputs = plan.inputs.len(),
            subtitle_tracks = next_subtitle_index,
            "mux plan built"
        );
        Ok(plan)
    }

    fn metadata(&self, output_index: usize, title: &str) -> SubtitleMetadata {
        SubtitleMetadata {
            output_index,
            language: SUBTITLE_LANGUAGE.to_string(),
            title: title.to_string(),
        }
    }
}
