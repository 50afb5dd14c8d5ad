//! FFmpeg execution adapter
//!
//! Executes a [`MuxPlan`] with stream copy. A failed or timed-out run never
//! leaves a partial output behind.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::adapters::process::{run_with_timeout, tail_chars, ProcessError};
use crate::domain::errors::*;
use crate::planner::MuxPlan;
use crate::ports::*;

/// Characters of ffmpeg stderr kept in a failure report
const STDERR_TAIL: usize = 2000;

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    program: PathBuf,
    timeout: Duration,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn discard_partial(output: &Path) {
        if tokio::fs::metadata(output).await.is_ok() {
            if let Err(e) = tokio::fs::remove_file(output).await {
                error!(output = %output.display(), "Could not remove partial output: {}", e);
            } else {
                debug!(output = %output.display(), "Removed partial output");
            }
        }
    }
}

#[async_trait]
impl MuxPort for FFmpegAdapter {
    async fn mux(&self, plan: &MuxPlan) -> Result<MuxReport, DomainError> {
        plan.validate()?;

        let started = Instant::now();
        info!(
            output = %plan.output.display(),
            added_subtitles = plan.added_subtitle_inputs(),
            "Running FFmpeg"
        );

        let result = run_with_timeout(&self.program, plan.to_ffmpeg_args(), self.timeout).await;

        let failure = match result {
            Ok(output) if output.success() => {
                let elapsed = started.elapsed();
                info!(output = %plan.output.display(), "Muxed in {:.1}s", elapsed.as_secs_f64());
                return Ok(MuxReport {
                    output: plan.output.clone(),
                    elapsed,
                });
            }
            Ok(output) => DomainError::MuxFailed {
                exit_code: output.status.code(),
                detail: tail_chars(output.stderr.trim(), STDERR_TAIL).to_string(),
            },
            Err(ProcessError::TimedOut(limit)) => DomainError::MuxFailed {
                exit_code: None,
                detail: format!("timed out after {}s", limit.as_secs()),
            },
            Err(e @ ProcessError::Spawn(_)) => DomainError::MuxFailed {
                exit_code: None,
                detail: format!("ffmpeg {}", e),
            },
        };

        Self::discard_partial(&plan.output).await;
        Err(failure)
    }
}
