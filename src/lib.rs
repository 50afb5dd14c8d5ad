//! Detective Conan archive pipeline
//!
//! Classifies episode files by release group, resolves a per-episode
//! processing policy, locates and synchronizes subtitle tracks, muxes them
//! in with ffmpeg and applies canonical filenames.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod planner;
pub mod ports;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{EpisodeId, EpisodePolicy, MediaInfo, SourceTag, SubtitleKind};
pub use error::{ArchiveError, ArchiveResult};
