// File config adapter - Configuration discovery and loading from YAML or TOML

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::AppConfig;
use crate::error::{ArchiveError, ArchiveResult};

/// Candidate file names tried in each search directory, in order
pub const CONFIG_FILE_NAMES: [&str; 3] = ["config.yaml", "config.yml", "config.toml"];

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub overwrite_existing: bool,
    pub skip_dubbed_episodes: bool,
}

impl ConfigOverrides {
    /// Apply over a loaded config; flags only ever switch behavior on
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(base_dir) = &self.base_dir {
            config.directories.base_dir = Some(base_dir.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.overwrite_existing {
            config.overwrite_existing = true;
        }
        if self.skip_dubbed_episodes {
            config.skip_dubbed_episodes = true;
        }
    }
}

/// Loaded configuration and the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// `None` when running on defaults
    pub source: Option<PathBuf>,
}

/// Locates and parses the configuration file
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_dirs: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Search the working directory, then the executable's directory
    pub fn new() -> Self {
        let mut search_dirs = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            search_dirs.push(cwd);
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if !search_dirs.contains(&exe_dir) {
                search_dirs.push(exe_dir);
            }
        }
        Self { search_dirs }
    }

    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// First existing candidate file across the search directories
    pub fn discover(&self) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    /// Load `explicit` if given, otherwise the discovered file, otherwise
    /// defaults. Overrides are applied before validation.
    pub fn load(
        &self,
        explicit: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> ArchiveResult<LoadedConfig> {
        let source = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => self.discover(),
        };

        let mut config = match &source {
            Some(path) => Self::read_file(path)?,
            None => {
                debug!("No configuration file found");
                AppConfig::default()
            }
        };

        overrides.apply(&mut config);
        config.validate()?;

        Ok(LoadedConfig { config, source })
    }

    /// Parse one file, choosing the format by extension
    pub fn read_file(path: &Path) -> ArchiveResult<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|source| ArchiveError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read configuration from {}", path.display());
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> ArchiveResult<AppConfig> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parsed = match extension.as_deref() {
            Some("toml") => toml::from_str::<AppConfig>(content).map_err(|e| e.to_string()),
            // Empty YAML documents deserialize as unit, not as an empty map
            _ if content.trim().is_empty() => Ok(AppConfig::default()),
            Some("yaml") | Some("yml") | None => {
                serde_yaml::from_str::<AppConfig>(content).map_err(|e| e.to_string())
            }
            Some(other) => Err(format!("unsupported config format '.{}'", other)),
        };

        parsed.map_err(|message| ArchiveError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
