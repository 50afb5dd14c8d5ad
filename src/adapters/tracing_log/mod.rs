// Tracing log adapter - Subscriber setup for console and log file output

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogFormat;
use crate::error::{ArchiveError, ArchiveResult};

/// Map a configured level name onto a tracing filter directive.
///
/// Accepts tracing names and the `WARNING` / `CRITICAL` spellings used in
/// older config files. Unknown names fall back to `info`.
pub fn filter_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => "info",
    }
}

/// Build the filter: `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(level)))
}

/// Install the global subscriber.
///
/// Console output goes to stderr; when `log_file` is given, the same events are
/// appended to it without ANSI colors.
pub fn init_logging(level: &str, format: LogFormat, log_file: Option<&Path>) -> ArchiveResult<()> {
    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ArchiveError::Logging(format!("cannot open {}: {}", path.display(), e))
                })?;
            Some(Mutex::new(file))
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(build_filter(level));

    let result = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(file.map(|writer| fmt::layer().with_ansi(false).with_writer(writer)))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file.map(|writer| fmt::layer().json().with_writer(writer)))
            .try_init(),
    };

    result.map_err(|e| ArchiveError::Logging(e.to_string()))
}
