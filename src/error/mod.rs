//! Error handling module for startup and configuration failures

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the archiver before any episode is touched
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML/TOML for the expected shape
    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required directory does not exist
    #[error("Missing required directory {name}: {path}")]
    MissingDirectory { name: &'static str, path: PathBuf },

    /// An external tool could not be started
    #[error("External tool not available: {tool} ({message})")]
    ToolUnavailable { tool: String, message: String },

    /// Logging could not be initialized
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for startup operations
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
