// Domain errors - Per-episode failure kinds

use std::fmt;

/// Domain-specific error types.
///
/// Every variant is scoped to a single episode; a batch run logs it and
/// moves on to the next file.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Episode number outside [1, 1132]
    InvalidEpisode(u32),
    /// No episode number could be extracted from the filename
    ClassificationAmbiguous(String),
    /// Policy requires subtitles but none could be located
    SubtitleMissing { episode: u16 },
    /// Subtitle synchronization failed and the fallback copy failed too
    SyncFailed(String),
    /// Primary video could not be opened or probed
    ProbeFailed(String),
    /// Mux plan violates its own invariants
    InvalidPlan(String),
    /// External muxer failed or timed out
    MuxFailed { exit_code: Option<i32>, detail: String },
    /// Destination already exists and overwriting is disabled
    RenameCollision(String),
    /// Requested episode is not present in any season directory
    EpisodeNotFound(u16),
    /// Filesystem operation failed
    FsFail(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidEpisode(n) => {
                write!(f, "Invalid episode number: {} (expected 1-1132)", n)
            }
            DomainError::ClassificationAmbiguous(name) => {
                write!(f, "Could not extract episode number from: {}", name)
            }
            DomainError::SubtitleMissing { episode } => {
                write!(f, "No subtitles found for episode {}", episode)
            }
            DomainError::SyncFailed(msg) => write!(f, "Subtitle sync failed: {}", msg),
            DomainError::ProbeFailed(msg) => write!(f, "Probe failed: {}", msg),
            DomainError::InvalidPlan(msg) => write!(f, "Invalid mux plan: {}", msg),
            DomainError::MuxFailed { exit_code, detail } => match exit_code {
                Some(code) => write!(f, "Mux failed (exit code {}): {}", code, detail),
                None => write!(f, "Mux failed: {}", detail),
            },
            DomainError::RenameCollision(path) => write!(
                f,
                "Destination already exists: {} (use --force to overwrite)",
                path
            ),
            DomainError::EpisodeNotFound(ep) => {
                write!(f, "Episode {} not found in any season directory", ep)
            }
            DomainError::FsFail(msg) => write!(f, "Filesystem error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
