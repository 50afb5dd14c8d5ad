// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod file_config;
pub mod fs_local;
pub mod probe_ffprobe;
pub mod process;
pub mod sync_ffsubsync;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use file_config::{ConfigLoader, ConfigOverrides, LoadedConfig};
pub use fs_local::FsLocalAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use sync_ffsubsync::FfsubsyncAdapter;
pub use tracing_log::init_logging;
