//! Advisory lock on a data directory (fs2).
//!
//! Lock file path: <data_dir>/LOCK. The storage core itself never takes it;
//! tools that open a directory from outside a running process (the CLI) do.
//! Released on Drop.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use log::debug;

use crate::consts::LOCK_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Read-only tools (status, scan, doctor).
    Shared,
    /// Writers (append).
    Exclusive,
}

pub struct DirLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl DirLock {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!("released {:?} lock {}", self.mode, self.path.display());
    }
}

pub fn lock_file_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}

fn open_lock_file(root: &Path) -> Result<(File, PathBuf)> {
    std::fs::create_dir_all(root)
        .with_context(|| format!("create data dir {}", root.display()))?;
    let path = lock_file_path(root);
    let f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("open lock file {}", path.display()))?;
    Ok((f, path))
}

/// Fails instead of blocking when another process holds a conflicting lock.
pub fn try_acquire(root: &Path, mode: LockMode) -> Result<DirLock> {
    let (file, path) = open_lock_file(root)?;
    match mode {
        LockMode::Shared => file
            .try_lock_shared()
            .with_context(|| format!("data dir is locked: {}", path.display()))?,
        LockMode::Exclusive => file
            .try_lock_exclusive()
            .with_context(|| format!("data dir is locked: {}", path.display()))?,
    }
    Ok(DirLock { file, path, mode })
}
