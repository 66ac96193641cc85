// ============================================================================
// audex-core/src/engine/workspace.rs
// ============================================================================
//
// ENGINE WORKSPACE: The Engine's Private Filesystem
//
// ffmpeg runs with this directory as its working directory. Inputs are
// "mounted" by linking the user's file into a named subdirectory, so the
// bytes are never copied; outputs are written next to the mount
// directories and read back by name. The whole tree is a TempDir and goes
// away with the engine.

use crate::config::{ENGINE_DIR_PREFIX, EngineConfig};
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// A file linked read-only into a mount directory.
#[derive(Debug, Clone)]
pub(crate) struct Mount {
    pub link: PathBuf,
    /// Path handed to ffmpeg, relative to the workspace root.
    pub input_path: String,
}

pub(crate) struct Workspace {
    root: TempDir,
    mounts: HashMap<String, Mount>,
}

impl Workspace {
    pub fn create(config: &EngineConfig) -> CoreResult<Self> {
        let base = config
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&base)?;

        let root = TempFileBuilder::new()
            .prefix(ENGINE_DIR_PREFIX)
            .tempdir_in(&base)?;
        log::debug!("Engine workspace created at {}", root.path().display());

        Ok(Self {
            root,
            mounts: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Maps an engine path (`/input_mnt`, `track_1_0.mp3`) into the workspace.
    /// Leading slashes are accepted; parent components are rejected.
    pub fn resolve(&self, name: &str) -> CoreResult<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        let valid = relative.components().count() > 0
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(CoreError::PathError(format!(
                "'{name}' is not a valid engine path"
            )));
        }
        Ok(self.root().join(relative))
    }

    pub fn create_dir(&self, dir: &str) -> CoreResult<()> {
        fs::create_dir(self.resolve(dir)?)?;
        Ok(())
    }

    pub fn delete_dir(&self, dir: &str) -> CoreResult<()> {
        fs::remove_dir(self.resolve(dir)?)?;
        Ok(())
    }

    pub fn mount(&mut self, dir: &str, file: &Path) -> CoreResult<Mount> {
        let key = normalize(dir);
        if self.mounts.contains_key(&key) {
            return Err(CoreError::AlreadyMounted(key));
        }

        let dir_path = self.resolve(&key)?;
        if !dir_path.is_dir() {
            return Err(CoreError::PathError(format!(
                "Mount directory '{key}' does not exist"
            )));
        }

        let source = file.canonicalize().map_err(|e| {
            CoreError::PathError(format!("Cannot open input '{}': {e}", file.display()))
        })?;
        if !source.is_file() {
            return Err(CoreError::PathError(format!(
                "Input '{}' is not a file",
                source.display()
            )));
        }
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CoreError::PathError(format!("Input '{}' has no file name", source.display()))
            })?;

        let link = dir_path.join(&file_name);
        link_read_only(&source, &link)?;

        let mount = Mount {
            link,
            input_path: format!("{key}/{file_name}"),
        };
        self.mounts.insert(key, mount.clone());
        Ok(mount)
    }

    pub fn unmount(&mut self, dir: &str) -> CoreResult<()> {
        let key = normalize(dir);
        let mount = self
            .mounts
            .remove(&key)
            .ok_or_else(|| CoreError::NotMounted(key.clone()))?;
        fs::remove_file(&mount.link)?;
        Ok(())
    }

    pub fn is_mounted(&self, dir: &str) -> bool {
        self.mounts.contains_key(&normalize(dir))
    }

    pub fn read_file(&self, name: &str) -> CoreResult<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|source| CoreError::OutputRead {
            name: name.to_string(),
            source,
        })
    }

    pub fn delete_file(&self, name: &str) -> CoreResult<()> {
        fs::remove_file(self.resolve(name)?)?;
        Ok(())
    }
}

fn normalize(dir: &str) -> String {
    dir.trim_matches('/').to_string()
}

#[cfg(unix)]
fn link_read_only(source: &Path, link: &Path) -> CoreResult<()> {
    std::os::unix::fs::symlink(source, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn link_read_only(source: &Path, link: &Path) -> CoreResult<()> {
    // Hard links need the same volume; fall back to a copy.
    if fs::hard_link(source, link).is_err() {
        fs::copy(source, link)?;
    }
    Ok(())
}
