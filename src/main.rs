//! Detective Conan archive CLI
//!
//! # Usage
//!
//! ```bash
//! conan-archive run
//! conan-archive episode 730 --force
//! conan-archive inspect "[Fabre-RAW] Detective Conan 0730 [NetflixJP] [1080p].mkv" --json
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use conan_archive::adapters::{init_logging, ConfigLoader};
use conan_archive::app::AppContainer;
use conan_archive::cli::{commands, Cli, Commands};
use conan_archive::config::DirectoryLayout;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = ConfigLoader::new()
        .load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    let config = loaded.config;

    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    let layout = DirectoryLayout::resolve(&config.directories, &cwd);

    // Dry runs log to the console only
    let log_file = match cli.command {
        Commands::Inspect(_) => None,
        _ => Some(layout.base_dir.join(&config.log_file)),
    };
    init_logging(&config.log_level, config.log_format, log_file.as_deref())
        .context("Failed to initialize logging")?;

    match &loaded.source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => warn!("No configuration file found, using defaults"),
    }

    let container = AppContainer::new(config, layout);
    if !matches!(cli.command, Commands::Inspect(_)) {
        info!("Starting Detective Conan archive processing");
        container.layout().log_summary();
        info!(
            "Tools: ffmpeg={} ffprobe={} ffs={}",
            container.tools().ffmpeg.display(),
            container.tools().ffprobe.display(),
            container.tools().ffsubsync.display()
        );
    }

    let ok = match cli.command {
        Commands::Run => commands::run(&container).await?,
        Commands::Episode(args) => commands::episode(&container, args).await?,
        Commands::Inspect(args) => commands::inspect(&container, args)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
