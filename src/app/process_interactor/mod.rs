// Process interactor - Orchestrates the per-episode pipeline and batch runs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, DirectoryLayout, SubtitleLabels};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::planner::{MuxPlanBuilder, SubtitleLocator};
use crate::ports::*;

/// Run-wide values the pipeline reads but never changes
#[derive(Debug, Clone)]
pub struct ProcessSettings {
    pub layout: DirectoryLayout,
    pub labels: SubtitleLabels,
    pub namer: OutputNamer,
    pub overrides: PolicyOverrides,
    pub skip_dubbed_episodes: bool,
    pub dubbed_episodes: BTreeSet<EpisodeId>,
    pub video_extensions: Vec<String>,
    pub create_backups: bool,
    pub cleanup_temp_files: bool,
    pub overwrite_existing: bool,
}

impl ProcessSettings {
    pub fn from_config(config: &AppConfig, layout: DirectoryLayout) -> Self {
        Self {
            layout,
            labels: config.subtitle_labels.clone(),
            namer: config.output_namer(),
            overrides: config.effective_overrides(),
            skip_dubbed_episodes: config.skip_dubbed_episodes,
            dubbed_episodes: config.dubbed_episodes.clone(),
            video_extensions: config.naming.video_extensions.clone(),
            create_backups: config.create_backups,
            cleanup_temp_files: config.cleanup_temp_files,
            overwrite_existing: config.overwrite_existing,
        }
    }
}

/// What happened to one video file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EpisodeAction {
    /// Moved to the canonical name, tracks untouched
    Renamed { from: PathBuf },
    /// Already at the canonical name, nothing to do
    AlreadyNamed,
    /// New container written with the added subtitle tracks
    Muxed {
        fan: Option<SyncStatus>,
        bb: Option<SyncStatus>,
    },
}

/// Result of processing one episode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeReport {
    pub episode: EpisodeId,
    pub source: SourceTag,
    /// Final location of the episode
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(flatten)]
    pub action: EpisodeAction,
}

/// Aggregate counts for one season directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeasonReport {
    pub season: PathBuf,
    pub succeeded: usize,
    pub failed: usize,
    /// Files whose name carried no recognizable episode number
    pub unparsed: usize,
    /// Files already carrying their canonical output name
    pub archived: usize,
    pub formats: BTreeMap<SourceTag, usize>,
    pub failures: Vec<EpisodeFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeFailure {
    pub episode: EpisodeId,
    pub path: PathBuf,
    pub error: String,
}

/// Whole-library run summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub seasons: Vec<SeasonReport>,
    /// Season directories that could not be listed
    pub unreadable_seasons: usize,
    pub temp_files_removed: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.seasons.iter().map(|s| s.succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.seasons.iter().map(|s| s.failed).sum()
    }

    pub fn unparsed(&self) -> usize {
        self.seasons.iter().map(|s| s.unparsed).sum()
    }

    pub fn archived(&self) -> usize {
        self.seasons.iter().map(|s| s.archived).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || self.unreadable_seasons > 0
    }
}

/// Subtitle asset after synchronization into the temp directory
struct SyncedAsset {
    path: PathBuf,
    status: SyncStatus,
}

/// Interactor for the archive pipeline
pub struct ProcessInteractor {
    probe_port: Arc<dyn ProbePort>,
    sync_port: Arc<dyn SyncPort>,
    mux_port: Arc<dyn MuxPort>,
    fs_port: Arc<dyn FsPort>,
    settings: ProcessSettings,
    locator: SubtitleLocator,
    plan_builder: MuxPlanBuilder,
}

impl ProcessInteractor {
    /// Create new process interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        sync_port: Arc<dyn SyncPort>,
        mux_port: Arc<dyn MuxPort>,
        fs_port: Arc<dyn FsPort>,
        settings: ProcessSettings,
    ) -> Self {
        let locator = SubtitleLocator::new(&settings.layout);
        let plan_builder = MuxPlanBuilder::new(settings.labels.clone());
        Self {
            probe_port,
            sync_port,
            mux_port,
            fs_port,
            settings,
            locator,
            plan_builder,
        }
    }

    pub fn settings(&self) -> &ProcessSettings {
        &self.settings
    }

    /// Classify a file and resolve its policy, dubbed override included
    pub fn resolve_policy(&self, filename: &str, ep: EpisodeId) -> (SourceTag, EpisodePolicy) {
        let source = SourceClassifier::classify(filename);
        let policy = EpisodePolicyResolver::resolve(ep, source, &self.settings.overrides);
        let policy = EpisodePolicyResolver::apply_dubbed_override(
            policy,
            ep,
            self.settings.skip_dubbed_episodes,
            &self.settings.dubbed_episodes,
        );
        (source, policy)
    }

    /// Run the full pipeline for one video file
    pub async fn process_episode(
        &self,
        video: &Path,
        ep: EpisodeId,
    ) -> Result<EpisodeReport, DomainError> {
        let filename = file_name_of(video);

        if self.settings.create_backups {
            self.backup(video, &filename).await?;
        }

        let (source, policy) = self.resolve_policy(&filename, ep);
        let output_name = self.settings.namer.output_name(ep, source, &policy);
        let output = video
            .parent()
            .map(|dir| dir.join(&output_name))
            .unwrap_or_else(|| PathBuf::from(&output_name));

        info!(episode = ep.get(), source = %source, "Processing episode");

        if let Some(reason) = policy.skip {
            info!(episode = ep.get(), "Skipping subtitle processing ({})", reason);
        }
        if policy.is_rename_only() {
            return self.rename_to_canonical(video, &output, ep, source, policy.skip).await;
        }

        let fan = self.locate(ep, SubtitleKind::Fan, &policy);
        let bb = self.locate(ep, SubtitleKind::Bb, &policy);

        if fan.is_none() && bb.is_none() {
            return self.without_subtitles(video, &output, ep, source, &policy).await;
        }

        self.check_collision(video, &output).await?;

        let media = self.probe_port.probe_media(video).await?;
        debug!(
            episode = ep.get(),
            video = media.video_streams,
            audio = media.audio_streams,
            subtitles = media.subtitle_streams,
            "Probed primary video"
        );

        let fan = self.sync_asset(video, fan, ep, SubtitleKind::Fan).await;
        let bb = self.sync_asset(video, bb, ep, SubtitleKind::Bb).await;
        let sidecars: Vec<PathBuf> = fan.iter().chain(bb.iter()).map(|a| a.path.clone()).collect();

        if fan.is_none() && bb.is_none() {
            self.remove_sidecars(&sidecars).await;
            return self.without_subtitles(video, &output, ep, source, &policy).await;
        }

        let temp_output = self.settings.layout.temp_dir.join(format!(
            "temp_{}.{}",
            ep.padded(),
            self.settings.namer.extension()
        ));
        let plan = self.plan_builder.build(
            &media,
            &policy,
            fan.as_ref().map(|a| a.path.as_path()),
            bb.as_ref().map(|a| a.path.as_path()),
            &temp_output,
        );
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => {
                self.remove_sidecars(&sidecars).await;
                return Err(e);
            }
        };

        if let Err(e) = self.mux_port.mux(&plan).await {
            error!(episode = ep.get(), "Mux failed, original left untouched: {}", e);
            self.remove_sidecars(&sidecars).await;
            return Err(e);
        }

        let finalized = self.finalize(&temp_output, video, &output).await;
        self.remove_sidecars(&sidecars).await;
        finalized?;

        info!(episode = ep.get(), output = %output.display(), "Episode complete");
        Ok(EpisodeReport {
            episode: ep,
            source,
            output,
            skipped: None,
            action: EpisodeAction::Muxed {
                fan: fan.map(|a| a.status),
                bb: bb.map(|a| a.status),
            },
        })
    }

    /// Process every recognizable video in one season directory, in
    /// ascending episode order
    pub async fn process_season(&self, season_dir: &Path) -> Result<SeasonReport, DomainError> {
        let season_name = file_name_of(season_dir);
        info!("Processing season: {}", season_name);

        let videos = self
            .fs_port
            .list_videos(season_dir, &self.settings.video_extensions)
            .await?;

        let mut report = SeasonReport {
            season: season_dir.to_path_buf(),
            ..SeasonReport::default()
        };

        let mut episodes = Vec::new();
        for video in videos {
            let filename = file_name_of(&video);
            if let Some(ep) = self.settings.namer.archived_episode(&filename) {
                debug!(episode = ep.get(), path = %video.display(), "Already archived");
                report.archived += 1;
                continue;
            }
            match SourceClassifier::require_episode(&filename) {
                Ok(ep) => {
                    *report
                        .formats
                        .entry(SourceClassifier::classify(&filename))
                        .or_insert(0) += 1;
                    episodes.push((ep, video));
                }
                Err(e) => {
                    warn!(path = %video.display(), "{}", e);
                    report.unparsed += 1;
                }
            }
        }
        episodes.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        info!("Found {} episodes in {}", episodes.len(), season_name);
        for (source, count) in &report.formats {
            info!("  {}: {} files", source, count);
        }

        for (ep, video) in episodes {
            match self.process_episode(&video, ep).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    error!(episode = ep.get(), path = %video.display(), "Episode failed: {}", e);
                    report.failed += 1;
                    report.failures.push(EpisodeFailure {
                        episode: ep,
                        path: video,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Season {} complete: {} succeeded, {} failed, {} unparsed, {} already archived",
            season_name, report.succeeded, report.failed, report.unparsed, report.archived
        );
        Ok(report)
    }

    /// Process every season under the shows directory
    pub async fn run_library(&self) -> Result<BatchReport, DomainError> {
        let started_at = Local::now();
        info!("Starting batch processing at {}", started_at.format("%Y-%m-%d %H:%M:%S"));

        let season_dirs = self
            .fs_port
            .list_season_dirs(&self.settings.layout.shows_dir)
            .await?;
        info!("Found {} season directories", season_dirs.len());

        let mut seasons = Vec::new();
        let mut unreadable_seasons = 0;
        for season_dir in &season_dirs {
            match self.process_season(season_dir).await {
                Ok(report) => seasons.push(report),
                Err(e) => {
                    error!(path = %season_dir.display(), "Could not process season: {}", e);
                    unreadable_seasons += 1;
                }
            }
        }

        let temp_files_removed = if self.settings.cleanup_temp_files {
            self.cleanup_temp_dir().await
        } else {
            0
        };

        let report = BatchReport {
            started_at,
            finished_at: Local::now(),
            seasons,
            unreadable_seasons,
            temp_files_removed,
        };

        let elapsed = report.finished_at - report.started_at;
        info!(
            "Batch complete in {}s: {} succeeded, {} failed, {} unparsed, {} already archived",
            elapsed.num_seconds(),
            report.succeeded(),
            report.failed(),
            report.unparsed(),
            report.archived()
        );
        Ok(report)
    }

    /// First video across all seasons carrying episode number `ep`.
    ///
    /// An unprocessed release wins over an already archived copy.
    pub async fn find_episode(&self, ep: EpisodeId) -> Result<PathBuf, DomainError> {
        let season_dirs = self
            .fs_port
            .list_season_dirs(&self.settings.layout.shows_dir)
            .await?;

        let mut archived = None;
        for season_dir in season_dirs {
            let videos = self
                .fs_port
                .list_videos(&season_dir, &self.settings.video_extensions)
                .await?;
            for video in videos {
                let filename = file_name_of(&video);
                if self.settings.namer.archived_episode(&filename) == Some(ep) {
                    archived.get_or_insert(video);
                } else if SourceClassifier::extract_episode(&filename) == Some(ep) {
                    return Ok(video);
                }
            }
        }

        archived.ok_or(DomainError::EpisodeNotFound(ep.get()))
    }

    /// Locate one episode, log its resolved policy and process it
    pub async fn process_single(&self, ep: EpisodeId) -> Result<EpisodeReport, DomainError> {
        let video = self.find_episode(ep).await?;
        let filename = file_name_of(&video);
        let (source, policy) = self.resolve_policy(&filename, ep);

        if self.settings.namer.archived_episode(&filename).is_some() {
            info!("Episode {} is already archived: {}", ep, video.display());
            return Ok(EpisodeReport {
                episode: ep,
                source,
                output: video,
                skipped: policy.skip,
                action: EpisodeAction::AlreadyNamed,
            });
        }

        info!("Found episode {}: {}", ep, video.display());
        info!("  Source format: {}", source);
        info!("  Range: {}", EpisodeRange::of(ep));
        info!("  Policy: {:?}", policy);

        let report = self.process_episode(&video, ep).await;
        if self.settings.cleanup_temp_files {
            self.cleanup_temp_dir().await;
        }
        report
    }

    fn locate(&self, ep: EpisodeId, kind: SubtitleKind, policy: &EpisodePolicy) -> Option<PathBuf> {
        if !policy.wants(kind) {
            return None;
        }
        let found = self.locator.locate(ep, kind);
        match &found {
            Some(path) => debug!(episode = ep.get(), kind = %kind, path = %path.display(), "Found subtitles"),
            None => warn!(episode = ep.get(), kind = %kind, "No subtitles found"),
        }
        found
    }

    /// No asset was usable: keep the file as-is under its canonical name
    /// when it already carries subtitles, otherwise fail
    async fn without_subtitles(
        &self,
        video: &Path,
        output: &Path,
        ep: EpisodeId,
        source: SourceTag,
        policy: &EpisodePolicy,
    ) -> Result<EpisodeReport, DomainError> {
        if !policy.keep_existing_subs {
            return Err(DomainError::SubtitleMissing { episode: ep.get() });
        }
        warn!(episode = ep.get(), "No subtitles to add, keeping embedded tracks");
        self.rename_to_canonical(video, output, ep, source, None).await
    }

    async fn rename_to_canonical(
        &self,
        video: &Path,
        output: &Path,
        ep: EpisodeId,
        source: SourceTag,
        skipped: Option<SkipReason>,
    ) -> Result<EpisodeReport, DomainError> {
        let action = if video == output {
            debug!(episode = ep.get(), "Already has the canonical name");
            EpisodeAction::AlreadyNamed
        } else {
            self.check_collision(video, output).await?;
            self.fs_port.replace_file(video, output).await?;
            info!(
                episode = ep.get(),
                "Renamed: {} -> {}",
                file_name_of(video),
                file_name_of(output)
            );
            EpisodeAction::Renamed {
                from: video.to_path_buf(),
            }
        };

        Ok(EpisodeReport {
            episode: ep,
            source,
            output: output.to_path_buf(),
            skipped,
            action,
        })
    }

    /// Refuse to clobber a different existing file unless overwriting is on
    async fn check_collision(&self, video: &Path, output: &Path) -> Result<(), DomainError> {
        if video == output || !self.fs_port.file_exists(output).await? {
            return Ok(());
        }
        if self.settings.overwrite_existing {
            warn!(path = %output.display(), "Destination exists and will be overwritten");
            Ok(())
        } else {
            Err(DomainError::RenameCollision(output.display().to_string()))
        }
    }

    async fn sync_asset(
        &self,
        video: &Path,
        asset: Option<PathBuf>,
        ep: EpisodeId,
        kind: SubtitleKind,
    ) -> Option<SyncedAsset> {
        let asset = asset?;
        let synced = self.settings.layout.temp_dir.join(format!(
            "{}_{}_synced.{}",
            ep.padded(),
            kind.as_str(),
            kind.extension()
        ));

        match self.sync_port.sync_subtitle(video, &asset, &synced).await {
            Ok(status) => {
                if let SyncStatus::NotSynced { reason } = &status {
                    warn!(episode = ep.get(), kind = %kind, "Using unsynced subtitles: {}", reason);
                }
                Some(SyncedAsset { path: synced, status })
            }
            Err(e) => {
                warn!(episode = ep.get(), kind = %kind, "Dropping subtitle asset: {}", e);
                None
            }
        }
    }

    /// Move the new container into place, then drop the original
    async fn finalize(&self, temp_output: &Path, video: &Path, output: &Path) -> Result<(), DomainError> {
        self.fs_port.replace_file(temp_output, output).await?;
        if video != output {
            if let Err(e) = self.fs_port.delete_file(video).await {
                warn!(path = %video.display(), "Could not remove original: {}", e);
            }
        }
        Ok(())
    }

    async fn backup(&self, video: &Path, filename: &str) -> Result<(), DomainError> {
        let backup = self.settings.layout.backup_dir.join(filename);
        if self.fs_port.file_exists(&backup).await? {
            debug!(path = %backup.display(), "Backup already present");
            return Ok(());
        }
        self.fs_port.copy_file(video, &backup).await?;
        info!(path = %backup.display(), "Created backup");
        Ok(())
    }

    async fn remove_sidecars(&self, sidecars: &[PathBuf]) {
        for sidecar in sidecars {
            if let Err(e) = self.fs_port.delete_file(sidecar).await {
                debug!(path = %sidecar.display(), "Could not remove sidecar: {}", e);
            }
        }
    }

    async fn cleanup_temp_dir(&self) -> usize {
        match self.fs_port.clear_directory(&self.settings.layout.temp_dir).await {
            Ok(removed) => {
                if removed > 0 {
                    info!("Cleaned up {} temporary files", removed);
                }
                removed
            }
            Err(e) => {
                warn!("Temp directory cleanup failed: {}", e);
                0
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
