//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::app::AppContainer;
use crate::cli::args::{EpisodeArgs, InspectArgs};
use crate::domain::model::EpisodeId;

/// Execute the run command; `Ok(false)` when any episode failed
pub async fn run(container: &AppContainer) -> Result<bool> {
    container
        .preflight()
        .await
        .context("Preflight checks failed")?;

    let interactor = container.process_interactor();
    let report = interactor
        .run_library()
        .await
        .context("Could not enumerate season directories")?;

    info!("Processing Summary:");
    for season in &report.seasons {
        info!(
            "  {}: {} succeeded, {} failed, {} unparsed, {} already archived",
            season
                .season
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            season.succeeded,
            season.failed,
            season.unparsed,
            season.archived
        );
        for failure in &season.failures {
            error!("    episode {}: {}", failure.episode, failure.error);
        }
    }
    info!(
        "Total: {} succeeded, {} failed, {} unparsed, {} already archived",
        report.succeeded(),
        report.failed(),
        report.unparsed(),
        report.archived()
    );

    Ok(!report.has_failures())
}

/// Execute the episode command
pub async fn episode(container: &AppContainer, args: EpisodeArgs) -> Result<bool> {
    let ep = EpisodeId::new(args.number)?;

    container
        .preflight()
        .await
        .context("Preflight checks failed")?;

    match container.process_interactor().process_single(ep).await {
        Ok(report) => {
            info!("Episode {} complete: {}", ep, report.output.display());
            Ok(true)
        }
        Err(e) => {
            error!("Episode {} failed: {}", ep, e);
            Ok(false)
        }
    }
}

/// Execute the inspect command
pub fn inspect(container: &AppContainer, args: InspectArgs) -> Result<bool> {
    let filename = Path::new(&args.filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.filename.clone());

    let report = container.inspect_interactor().inspect(&filename);

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        println!("{}", report.to_text());
    }

    Ok(report.episode.is_some())
}
