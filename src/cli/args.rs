//! Command-line argument definitions

use clap::Args;

fn episode_number(s: &str) -> Result<u32, String> {
    clap_num::number_range(s, 1, 1132)
}

/// Arguments for the episode command
#[derive(Args, Debug)]
pub struct EpisodeArgs {
    /// Episode number (1-1132)
    #[arg(value_parser = episode_number)]
    pub number: u32,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Video filename (a path is accepted; only its last component is used)
    pub filename: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
