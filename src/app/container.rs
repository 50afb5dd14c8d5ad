use std::sync::Arc;

use tracing::info;

use crate::adapters::process::run_with_timeout;
use crate::adapters::{FFmpegAdapter, FFprobeAdapter, FfsubsyncAdapter, FsLocalAdapter};
use crate::app::{InspectInteractor, ProcessInteractor, ProcessSettings};
use crate::config::{AppConfig, DirectoryLayout, ToolPaths};
use crate::error::{ArchiveError, ArchiveResult};
use crate::planner::SubtitleLocator;
use crate::ports::{FsPort, MuxPort, ProbePort, SyncPort};

const PREFLIGHT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// Wires concrete adapters into the interactors for one run
pub struct AppContainer {
    config: AppConfig,
    layout: DirectoryLayout,
    tools: ToolPaths,
}

impl AppContainer {
    pub fn new(config: AppConfig, layout: DirectoryLayout) -> Self {
        let tools = ToolPaths::resolve(config.directories.ffmpeg_dir.as_deref());
        Self {
            config,
            layout,
            tools,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Check external tools and required directories before a batch
    pub async fn preflight(&self) -> ArchiveResult<()> {
        let checks = [
            (&self.tools.ffsubsync, "--version"),
            (&self.tools.ffmpeg, "-version"),
        ];
        for (program, flag) in checks {
            let output = run_with_timeout(program, [flag], PREFLIGHT_TIMEOUT)
                .await
                .map_err(|e| ArchiveError::ToolUnavailable {
                    tool: program.display().to_string(),
                    message: e.to_string(),
                })?;
            if !output.success() {
                return Err(ArchiveError::ToolUnavailable {
                    tool: program.display().to_string(),
                    message: format!("exited with {}", output.status),
                });
            }
            info!("Found {}", program.display());
        }

        self.layout.validate()?;
        self.layout.ensure_temp_dir()?;
        Ok(())
    }

    pub fn process_interactor(&self) -> ProcessInteractor {
        let probe_port: Arc<dyn ProbePort> = Arc::new(FFprobeAdapter::new(self.tools.ffprobe.clone()));
        let sync_port: Arc<dyn SyncPort> = Arc::new(FfsubsyncAdapter::new(
            self.tools.ffsubsync.clone(),
            self.config.sync_timeout(),
        ));
        let mux_port: Arc<dyn MuxPort> = Arc::new(FFmpegAdapter::new(
            self.tools.ffmpeg.clone(),
            self.config.mux_timeout(),
        ));
        let fs_port: Arc<dyn FsPort> = Arc::new(FsLocalAdapter::new());

        ProcessInteractor::new(
            probe_port,
            sync_port,
            mux_port,
            fs_port,
            ProcessSettings::from_config(&self.config, self.layout.clone()),
        )
    }

    pub fn inspect_interactor(&self) -> InspectInteractor {
        InspectInteractor::new(
            SubtitleLocator::new(&self.layout),
            self.config.output_namer(),
            self.config.effective_overrides(),
        )
        .with_dubbed(
            self.config.skip_dubbed_episodes,
            self.config.dubbed_episodes.clone(),
        )
    }
}
