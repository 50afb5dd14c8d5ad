// Local filesystem adapter - File system operations on the archive tree

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::*;
use crate::ports::*;

/// Local filesystem adapter
#[derive(Debug, Default, Clone)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    /// Create new local filesystem adapter
    pub fn new() -> Self {
        Self
    }

    fn fail(action: &str, path: &Path, e: io::Error) -> DomainError {
        DomainError::FsFail(format!("Failed to {} {}: {}", action, path.display(), e))
    }

    /// Copy to a sibling of `to`, then rename over it, so a crash never
    /// leaves a truncated file at the destination
    fn copy_then_rename(from: &Path, to: &Path) -> Result<(), DomainError> {
        let mut staging = to.as_os_str().to_owned();
        staging.push(".part");
        let staging = PathBuf::from(staging);

        fs::copy(from, &staging).map_err(|e| Self::fail("copy to", &staging, e))?;
        if let Err(e) = fs::rename(&staging, to) {
            let _ = fs::remove_file(&staging);
            return Err(Self::fail("move into place", to, e));
        }
        fs::remove_file(from).map_err(|e| Self::fail("remove", from, e))?;
        Ok(())
    }

    fn has_extension(path: &Path, extensions: &[String]) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError> {
        Ok(file_path.exists())
    }

    async fn create_directory(&self, dir_path: &Path) -> Result<(), DomainError> {
        fs::create_dir_all(dir_path).map_err(|e| Self::fail("create directory", dir_path, e))
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        if let Some(parent) = to.parent() {
            self.create_directory(parent).await?;
        }
        fs::copy(from, to).map_err(|e| Self::fail("copy", from, e))?;
        Ok(())
    }

    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError> {
        fs::remove_file(file_path).map_err(|e| Self::fail("delete", file_path, e))
    }

    async fn replace_file(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) => {
                // Typically EXDEV when the temp directory is on another volume
                debug!("rename {} -> {} failed ({}), copying", from.display(), to.display(), e);
                Self::copy_then_rename(from, to)
            }
        }
    }

    async fn list_season_dirs(&self, shows_dir: &Path) -> Result<Vec<PathBuf>, DomainError> {
        let entries = fs::read_dir(shows_dir).map_err(|e| Self::fail("read", shows_dir, e))?;

        let mut seasons: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().contains("Season"))
                    .unwrap_or(false)
            })
            .collect();
        seasons.sort();
        Ok(seasons)
    }

    async fn list_videos(&self, dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, DomainError> {
        let mut videos = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                DomainError::FsFail(format!("Failed to list {}: {}", dir.display(), e))
            })?;
            if entry.file_type().is_file() && Self::has_extension(entry.path(), extensions) {
                videos.push(entry.into_path());
            }
        }
        videos.sort();
        Ok(videos)
    }

    async fn clear_directory(&self, dir: &Path) -> Result<usize, DomainError> {
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(dir).map_err(|e| Self::fail("read", dir, e))? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}
