use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use conan_archive::adapters::FsLocalAdapter;
use conan_archive::app::{EpisodeAction, ProcessInteractor, ProcessSettings};
use conan_archive::config::{AppConfig, DirectoryConfig, DirectoryLayout};
use conan_archive::domain::model::*;
use conan_archive::domain::rules::PolicyOverrides;
use conan_archive::planner::MuxPlan;
use conan_archive::ports::*;
use conan_archive::DomainError;

/// Test doubles for the external tools
mod mocks {
    use super::*;

    pub struct MockProbe {
        pub subtitle_streams: usize,
        pub fail: bool,
    }

    #[async_trait]
    impl ProbePort for MockProbe {
        async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
            if self.fail {
                return Err(DomainError::ProbeFailed(format!(
                    "cannot open {}",
                    file_path.display()
                )));
            }
            Ok(MediaInfo {
                path: file_path.to_path_buf(),
                video_streams: 1,
                audio_streams: 1,
                subtitle_streams: self.subtitle_streams,
            })
        }
    }

    /// Copies the subtitle through; kinds listed in `broken` cannot even copy
    #[derive(Default)]
    pub struct MockSync {
        pub unsynced: bool,
        pub broken: Vec<&'static str>,
    }

    #[async_trait]
    impl SyncPort for MockSync {
        async fn sync_subtitle(
            &self,
            _video: &Path,
            subtitle_in: &Path,
            subtitle_out: &Path,
        ) -> Result<SyncStatus, DomainError> {
            let name = subtitle_out
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.broken.iter().any(|kind| name.contains(kind)) {
                return Err(DomainError::SyncFailed("disk full".to_string()));
            }
            fs::copy(subtitle_in, subtitle_out).map_err(|e| DomainError::SyncFailed(e.to_string()))?;
            if self.unsynced {
                Ok(SyncStatus::NotSynced {
                    reason: "timed out after 45s".to_string(),
                })
            } else {
                Ok(SyncStatus::Synced)
            }
        }
    }

    /// Records every plan; writes a marker container unless told to fail
    #[derive(Default)]
    pub struct MockMux {
        pub fail: bool,
        pub plans: Mutex<Vec<MuxPlan>>,
    }

    impl MockMux {
        pub fn plans(&self) -> Vec<MuxPlan> {
            self.plans.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MuxPort for MockMux {
        async fn mux(&self, plan: &MuxPlan) -> Result<MuxReport, DomainError> {
            self.plans.lock().unwrap().push(plan.clone());
            for input in &plan.inputs {
                assert!(input.is_file(), "mux input missing: {}", input.display());
            }
            if self.fail {
                return Err(DomainError::MuxFailed {
                    exit_code: Some(1),
                    detail: "Invalid data found when processing input".to_string(),
                });
            }
            fs::write(&plan.output, b"muxed").unwrap();
            Ok(MuxReport {
                output: plan.output.clone(),
                elapsed: Duration::from_millis(5),
            })
        }
    }
}

use mocks::*;

/// Temporary archive tree with the default directory names
struct Archive {
    _dir: TempDir,
    layout: DirectoryLayout,
    season: PathBuf,
}

impl Archive {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout = DirectoryLayout::resolve(&DirectoryConfig::default(), dir.path());
        for path in [&layout.shows_dir, &layout.fan_subs_dir, &layout.bb_subs_dir, &layout.temp_dir] {
            fs::create_dir_all(path).unwrap();
        }
        let season = layout.shows_dir.join("Season 01");
        fs::create_dir_all(&season).unwrap();
        Self {
            _dir: dir,
            layout,
            season,
        }
    }

    fn video(&self, name: &str) -> PathBuf {
        let path = self.season.join(name);
        fs::write(&path, b"original").unwrap();
        path
    }

    fn fan_sub(&self, ep: u16) {
        fs::write(self.layout.fan_subs_dir.join(format!("{:04}.ass", ep)), b"[Script Info]").unwrap();
    }

    fn bb_sub(&self, ep: u16) {
        let name = if (124..=173).contains(&ep) {
            format!("[Fabre-RAW] Detective Conan Remastered {:04} [NetflixJP] [1080p].srt", ep)
        } else {
            format!("[Fabre-RAW] Detective Conan {:04} [NetflixJP] [1080p].srt", ep)
        };
        fs::write(self.layout.bb_subs_dir.join(name), b"1\n00:00:01,000 --> 00:00:02,000\n").unwrap();
    }

    fn settings(&self) -> ProcessSettings {
        ProcessSettings::from_config(&AppConfig::default(), self.layout.clone())
    }

    fn temp_files(&self) -> Vec<String> {
        fs::read_dir(&self.layout.temp_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

struct Harness {
    interactor: ProcessInteractor,
    mux: Arc<MockMux>,
}

fn harness(settings: ProcessSettings, probe: MockProbe, sync: MockSync, mux: MockMux) -> Harness {
    let mux = Arc::new(mux);
    let interactor = ProcessInteractor::new(
        Arc::new(probe),
        Arc::new(sync),
        Arc::clone(&mux) as Arc<dyn MuxPort>,
        Arc::new(FsLocalAdapter::new()),
        settings,
    );
    Harness { interactor, mux }
}

fn default_harness(settings: ProcessSettings) -> Harness {
    harness(
        settings,
        MockProbe {
            subtitle_streams: 1,
            fail: false,
        },
        MockSync::default(),
        MockMux::default(),
    )
}

fn ep(n: u32) -> EpisodeId {
    EpisodeId::new(n).unwrap()
}

fn subtitle_title_at(plan: &MuxPlan, index: usize) -> Option<String> {
    plan.subtitle_metadata
        .iter()
        .find(|m| m.output_index == index)
        .map(|m| m.title.clone())
}

#[tokio::test]
async fn test_erai_early_episode_is_renamed_only() {
    let archive = Archive::new();
    let video = archive.video("[Erai-raws] Detective Conan - 0050 [1080p][Multiple Subtitle][0F3A9C2E].mkv");
    let h = default_harness(archive.settings());

    let report = h.interactor.process_episode(&video, ep(50)).await.unwrap();

    assert_eq!(report.source, SourceTag::EraiRaws);
    assert_eq!(report.action, EpisodeAction::Renamed { from: video.clone() });
    assert_eq!(
        report.output,
        archive.season.join("Detective Conan Remastered 0050 [1080p].mkv")
    );
    assert!(report.output.is_file());
    assert!(!video.exists());
    assert!(h.mux.plans().is_empty());
}

#[tokio::test]
async fn test_bilibili_is_skipped_but_renamed() {
    let archive = Archive::new();
    archive.fan_sub(730);
    let video = archive.video("Detective Conan 0730 [Bilibili] [1080p].mkv");
    let h = default_harness(archive.settings());

    let report = h.interactor.process_episode(&video, ep(730)).await.unwrap();

    assert_eq!(report.skipped, Some(SkipReason::EmbeddedSubs));
    assert!(matches!(report.action, EpisodeAction::Renamed { .. }));
    assert_eq!(fs::read(&report.output).unwrap(), b"original");
    assert!(h.mux.plans().is_empty());
}

#[tokio::test]
async fn test_dubbed_episode_is_skipped_when_opted_in() {
    let archive = Archive::new();
    archive.fan_sub(200);
    let video = archive.video("[Crunchyroll] Detective Conan - 200 [Multi-Sub] [1080p].mkv");

    let mut settings = archive.settings();
    settings.skip_dubbed_episodes = true;
    settings.dubbed_episodes = BTreeSet::from([ep(200)]);
    let h = default_harness(settings);

    let report = h.interactor.process_episode(&video, ep(200)).await.unwrap();
    assert_eq!(report.skipped, Some(SkipReason::Dubbed));
    assert!(h.mux.plans().is_empty());
}

#[tokio::test]
async fn test_mux_success_finalizes_and_cleans_sidecars() {
    let archive = Archive::new();
    archive.fan_sub(200);
    archive.bb_sub(200);
    let video = archive.video("[Crunchyroll] Detective Conan - 200 [Multi-Sub] [1080p].mkv");
    let h = default_harness(archive.settings());

    let report = h.interactor.process_episode(&video, ep(200)).await.unwrap();

    assert_eq!(
        report.action,
        EpisodeAction::Muxed {
            fan: Some(SyncStatus::Synced),
            bb: Some(SyncStatus::Synced),
        }
    );
    assert_eq!(
        report.output,
        archive.season.join("Detective Conan Remastered 0200 [1080p].mkv")
    );
    assert_eq!(fs::read(&report.output).unwrap(), b"muxed");
    assert!(!video.exists());
    assert!(archive.temp_files().is_empty(), "leftovers: {:?}", archive.temp_files());

    let plans = h.mux.plans();
    assert_eq!(plans.len(), 1);
    let plan = &plans[0];
    assert_eq!(plan.inputs[0], video);
    assert_eq!(plan.inputs[1], archive.layout.temp_dir.join("0200_fan_synced.ass"));
    assert_eq!(plan.inputs[2], archive.layout.temp_dir.join("0200_bb_synced.srt"));
    assert_eq!(plan.output, archive.layout.temp_dir.join("temp_0200.mkv"));
    // Middle range drops the embedded track, so new tracks start at 0
    assert_eq!(subtitle_title_at(plan, 0).as_deref(), Some("Fan Subs [English]"));
    assert_eq!(subtitle_title_at(plan, 1).as_deref(), Some("BB Subs [English]"));
}

#[tokio::test]
async fn test_kept_track_shifts_fan_to_index_one() {
    let archive = Archive::new();
    archive.fan_sub(5);
    let video = archive.video("[Fabre-RAW] Detective Conan 0005 [NetflixJP] [1080p].mkv");
    let h = default_harness(archive.settings());

    h.interactor.process_episode(&video, ep(5)).await.unwrap();

    let plan = &h.mux.plans()[0];
    assert_eq!(plan.inputs.len(), 2);
    assert_eq!(subtitle_title_at(plan, 1).as_deref(), Some("Fan Subs [English]"));
    assert!(subtitle_title_at(plan, 0).is_none());
}

#[tokio::test]
async fn test_unsynced_subtitles_are_still_muxed() {
    let archive = Archive::new();
    archive.fan_sub(10);
    let video = archive.video("[RAW Reghost-Fabre] Detective Conan 10 [480p].mkv");
    let h = harness(
        archive.settings(),
        MockProbe {
            subtitle_streams: 0,
            fail: false,
        },
        MockSync {
            unsynced: true,
            broken: Vec::new(),
        },
        MockMux::default(),
    );

    let report = h.interactor.process_episode(&video, ep(10)).await.unwrap();
    assert_eq!(report.output, archive.season.join("Detective Conan 0010 [480p].mkv"));
    match report.action {
        EpisodeAction::Muxed { fan, bb } => {
            assert!(matches!(fan, Some(SyncStatus::NotSynced { .. })));
            assert!(bb.is_none());
        }
        other => panic!("expected mux, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_sidecar_copy_drops_only_that_asset() {
    let archive = Archive::new();
    archive.fan_sub(300);
    archive.bb_sub(300);
    let video = archive.video("[Fabre-RAW] Detective Conan 0300 [NetflixJP] [1080p].mkv");
    let h = harness(
        archive.settings(),
        MockProbe {
            subtitle_streams: 1,
            fail: false,
        },
        MockSync {
            unsynced: false,
            broken: vec!["_bb_"],
        },
        MockMux::default(),
    );

    let report = h.interactor.process_episode(&video, ep(300)).await.unwrap();
    assert_eq!(
        report.action,
        EpisodeAction::Muxed {
            fan: Some(SyncStatus::Synced),
            bb: None,
        }
    );
    assert_eq!(h.mux.plans()[0].inputs.len(), 2);
}

#[tokio::test]
async fn test_mux_failure_preserves_original() {
    let archive = Archive::new();
    archive.fan_sub(200);
    archive.bb_sub(200);
    let video = archive.video("[Crunchyroll] Detective Conan - 200 [Multi-Sub] [1080p].mkv");
    let h = harness(
        archive.settings(),
        MockProbe {
            subtitle_streams: 1,
            fail: false,
        },
        MockSync::default(),
        MockMux {
            fail: true,
            ..MockMux::default()
        },
    );

    let err = h.interactor.process_episode(&video, ep(200)).await.unwrap_err();

    assert!(matches!(err, DomainError::MuxFailed { exit_code: Some(1), .. }));
    assert_eq!(fs::read(&video).unwrap(), b"original");
    assert!(!archive
        .season
        .join("Detective Conan Remastered 0200 [1080p].mkv")
        .exists());
    assert!(archive.temp_files().is_empty());
}

#[tokio::test]
async fn test_probe_failure_rejects_plan() {
    let archive = Archive::new();
    archive.fan_sub(20);
    let video = archive.video("[Fabre-RAW] Detective Conan 0020 [NetflixJP] [1080p].mkv");
    let h = harness(
        archive.settings(),
        MockProbe {
            subtitle_streams: 0,
            fail: true,
        },
        MockSync::default(),
        MockMux::default(),
    );

    let err = h.interactor.process_episode(&video, ep(20)).await.unwrap_err();
    assert!(matches!(err, DomainError::ProbeFailed(_)));
    assert!(h.mux.plans().is_empty());
    assert!(video.exists());
}

#[tokio::test]
async fn test_collision_requires_overwrite() {
    let archive = Archive::new();
    archive.fan_sub(20);
    let video = archive.video("[Fabre-RAW] Detective Conan 0020 [NetflixJP] [1080p].mkv");
    let existing = archive.season.join("Detective Conan Remastered 0020 [1080p].mkv");
    fs::write(&existing, b"older copy").unwrap();

    let h = default_harness(archive.settings());
    let err = h.interactor.process_episode(&video, ep(20)).await.unwrap_err();
    assert!(matches!(err, DomainError::RenameCollision(_)));
    assert!(h.mux.plans().is_empty());
    assert_eq!(fs::read(&existing).unwrap(), b"older copy");
    assert!(video.exists());

    let mut settings = archive.settings();
    settings.overwrite_existing = true;
    let h = default_harness(settings);
    let report = h.interactor.process_episode(&video, ep(20)).await.unwrap();
    assert_eq!(report.output, existing);
    assert_eq!(fs::read(&existing).unwrap(), b"muxed");
    assert!(!video.exists());
}

#[tokio::test]
async fn test_missing_subtitles() {
    let archive = Archive::new();

    // Middle range drops embedded tracks, so nothing usable would remain
    let video = archive.video("[Fabre-RAW] Detective Conan 0400 [NetflixJP] [1080p].mkv");
    let h = default_harness(archive.settings());
    let err = h.interactor.process_episode(&video, ep(400)).await.unwrap_err();
    assert_eq!(err, DomainError::SubtitleMissing { episode: 400 });
    assert!(video.exists());

    // Late range keeps embedded tracks and degrades to a rename
    let video = archive.video("[Fabre-RAW] Detective Conan 1000 [NetflixJP] [1080p].mkv");
    let report = h.interactor.process_episode(&video, ep(1000)).await.unwrap();
    assert!(matches!(report.action, EpisodeAction::Renamed { .. }));
    assert!(h.mux.plans().is_empty());
}

#[tokio::test]
async fn test_already_named_file_is_left_alone() {
    let archive = Archive::new();
    let video = archive.video("Detective Conan 0050 [480p].mkv");

    let mut settings = archive.settings();
    let mut overrides = PolicyOverrides::new();
    overrides.insert(
        EpisodeRange::Early,
        EpisodePolicy {
            output_format: OutputFormat::Sd480,
            ..EpisodePolicy::default()
        },
    );
    settings.overrides = overrides;
    let h = default_harness(settings);

    let report = h.interactor.process_episode(&video, ep(50)).await.unwrap();
    assert_eq!(report.action, EpisodeAction::AlreadyNamed);
    assert_eq!(report.output, video);
    assert!(video.exists());
}

#[tokio::test]
async fn test_backup_created_before_processing() {
    let archive = Archive::new();
    let name = "[Erai-raws] Detective Conan - 0005 [1080p][Multiple Subtitle][11AA22BB].mkv";
    let video = archive.video(name);

    let mut settings = archive.settings();
    settings.create_backups = true;
    let h = default_harness(settings);

    h.interactor.process_episode(&video, ep(5)).await.unwrap();
    assert_eq!(fs::read(archive.layout.backup_dir.join(name)).unwrap(), b"original");
}

#[tokio::test]
async fn test_season_processes_in_episode_order() {
    let archive = Archive::new();
    for n in [3u16, 1, 2] {
        archive.fan_sub(n);
        archive.video(&format!("[Fabre-RAW] Detective Conan {:04} [NetflixJP] [1080p].mkv", n));
    }
    archive.video("behind the scenes.mkv");
    fs::write(archive.season.join("notes.txt"), b"").unwrap();

    let h = default_harness(archive.settings());
    let report = h.interactor.process_season(&archive.season).await.unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.unparsed, 1);
    assert_eq!(report.formats.get(&SourceTag::Fabre), Some(&3));

    let order: Vec<PathBuf> = h.mux.plans().iter().map(|p| p.output.clone()).collect();
    let expected: Vec<PathBuf> = (1..=3)
        .map(|n| archive.layout.temp_dir.join(format!("temp_{:04}.mkv", n)))
        .collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn test_season_failure_does_not_stop_batch() {
    let archive = Archive::new();
    archive.fan_sub(1);
    archive.video("[Fabre-RAW] Detective Conan 0001 [NetflixJP] [1080p].mkv");
    archive.video("[Fabre-RAW] Detective Conan 0400 [NetflixJP] [1080p].mkv");

    let h = default_harness(archive.settings());
    let report = h.interactor.process_season(&archive.season).await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].episode, ep(400));
}

#[tokio::test]
async fn test_run_library_walks_seasons_and_cleans_temp() {
    let archive = Archive::new();
    archive.fan_sub(1);
    archive.video("[Fabre-RAW] Detective Conan 0001 [NetflixJP] [1080p].mkv");

    let season_two = archive.layout.shows_dir.join("Season 02");
    fs::create_dir_all(&season_two).unwrap();
    fs::write(
        season_two.join("[Erai-raws] Detective Conan - 0100 [1080p][Multiple Subtitle][AB12CD34].mkv"),
        b"original",
    )
    .unwrap();
    fs::create_dir_all(archive.layout.shows_dir.join("Movies")).unwrap();
    fs::write(archive.layout.temp_dir.join("stale.ass"), b"").unwrap();

    let h = default_harness(archive.settings());
    let report = h.interactor.run_library().await.unwrap();

    assert_eq!(report.seasons.len(), 2);
    assert_eq!(report.succeeded(), 2);
    assert!(!report.has_failures());
    assert_eq!(report.temp_files_removed, 1);
    assert!(report.finished_at >= report.started_at);
    assert!(season_two
        .join("Detective Conan Remastered 0100 [1080p].mkv")
        .is_file());
}

#[tokio::test]
async fn test_single_episode_lookup() {
    let archive = Archive::new();
    archive.fan_sub(2);
    archive.video("[Fabre-RAW] Detective Conan 0002 [NetflixJP] [1080p].mkv");
    let h = default_harness(archive.settings());

    let report = h.interactor.process_single(ep(2)).await.unwrap();
    assert_eq!(
        report.output,
        archive.season.join("Detective Conan Remastered 0002 [1080p].mkv")
    );

    let err = h.interactor.process_single(ep(999)).await.unwrap_err();
    assert_eq!(err, DomainError::EpisodeNotFound(999));
}

#[tokio::test]
async fn test_second_season_pass_counts_archived_files() {
    let archive = Archive::new();
    for n in [1u16, 2] {
        archive.fan_sub(n);
        archive.video(&format!("[Fabre-RAW] Detective Conan {:04} [NetflixJP] [1080p].mkv", n));
    }
    archive.video("[RAW Reghost-Fabre] Detective Conan 10 [480p].mkv");
    archive.fan_sub(10);

    let h = default_harness(archive.settings());
    let first = h.interactor.process_season(&archive.season).await.unwrap();
    assert_eq!(first.succeeded, 3);
    assert_eq!(h.mux.plans().len(), 3);

    let second = h.interactor.process_season(&archive.season).await.unwrap();
    assert_eq!(second.archived, 3);
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.unparsed, 0);
    assert_eq!(h.mux.plans().len(), 3);
}

#[tokio::test]
async fn test_single_episode_already_archived() {
    let archive = Archive::new();
    archive.fan_sub(2);
    archive.video("[Fabre-RAW] Detective Conan 0002 [NetflixJP] [1080p].mkv");
    let h = default_harness(archive.settings());

    h.interactor.process_single(ep(2)).await.unwrap();
    let report = h.interactor.process_single(ep(2)).await.unwrap();

    assert_eq!(report.action, EpisodeAction::AlreadyNamed);
    assert_eq!(
        report.output,
        archive.season.join("Detective Conan Remastered 0002 [1080p].mkv")
    );
    assert_eq!(h.mux.plans().len(), 1);
}
