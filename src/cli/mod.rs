//! CLI module for the archiver
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::ConfigOverrides;

pub mod args;
pub mod commands;

/// Detective Conan archive pipeline
///
/// Renames episodes to their canonical names and muxes in fan and BB
/// subtitle tracks, synchronized to each video.
#[derive(Parser, Debug)]
#[command(name = "conan-archive")]
#[command(about = "Normalize and subtitle a Detective Conan episode archive")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(long, env = "CONAN_ARCHIVE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Base directory the configured directories are relative to
    #[arg(long, env = "CONAN_ARCHIVE_BASE_DIR", global = true)]
    pub base_dir: Option<PathBuf>,

    /// Logging level (TRACE, DEBUG, INFO, WARNING, ERROR)
    #[arg(long, env = "CONAN_ARCHIVE_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Overwrite existing files at the canonical output path
    #[arg(long, global = true)]
    pub force: bool,

    /// Only rename episodes listed as dubbed
    #[arg(long, global = true)]
    pub skip_dubbed: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_dir: self.base_dir.clone(),
            log_level: self.log_level.clone(),
            overwrite_existing: self.force,
            skip_dubbed_episodes: self.skip_dubbed,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every season in the shows directory
    Run,
    /// Process a single episode
    Episode(args::EpisodeArgs),
    /// Show what would be done for a filename, without touching anything
    Inspect(args::InspectArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["conan-archive", "run", "--force", "--base-dir", "/media/conan"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Run));
        let overrides = cli.overrides();
        assert!(overrides.overwrite_existing);
        assert!(!overrides.skip_dubbed_episodes);
        assert_eq!(overrides.base_dir, Some(PathBuf::from("/media/conan")));
    }

    #[test]
    fn test_episode_number_range() {
        let cli = Cli::try_parse_from(["conan-archive", "episode", "1132"]).unwrap();
        match cli.command {
            Commands::Episode(args) => assert_eq!(args.number, 1132),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["conan-archive", "episode", "0"]).is_err());
        assert!(Cli::try_parse_from(["conan-archive", "episode", "1133"]).is_err());
        assert!(Cli::try_parse_from(["conan-archive", "episode", "abc"]).is_err());
    }

    #[test]
    fn test_inspect_json_flag() {
        let cli = Cli::try_parse_from(["conan-archive", "inspect", "--json", "a.mkv"]).unwrap();
        match cli.command {
            Commands::Inspect(args) => {
                assert!(args.json);
                assert_eq!(args.filename, "a.mkv");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
