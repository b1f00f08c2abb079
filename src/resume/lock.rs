//! Advisory run lock using fd-lock
//!
//! The lock lives in a sibling file (`log.txt` → `log.txt.lock`) so the log
//! itself stays a plain append-only text file.

use super::ResumeError;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock file for `log_path`: the full file name with `.lock` appended
pub fn lock_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Lock file guarding one cursor log
pub struct ExportLock {
    lock: RwLock<File>,
    path: PathBuf,
}

impl ExportLock {
    /// Open (creating if needed) the lock file for `log_path`
    pub fn open(log_path: &Path) -> Result<Self, ResumeError> {
        let path = lock_path(log_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ResumeError::IoError(e.to_string()))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ResumeError::LockError(format!("Failed to open lock file: {e}")))?;

        Ok(Self {
            lock: RwLock::new(file),
            path,
        })
    }

    /// Take the exclusive lock without blocking.
    ///
    /// The lock is held until the returned guard is dropped.
    pub fn try_guard(&mut self) -> Result<RwLockWriteGuard<'_, File>, ResumeError> {
        let path = self.path.display().to_string();
        self.lock.try_write().map_err(|e| {
            ResumeError::LockError(format!(
                "another export holds {path} ({e}); refusing to run concurrently"
            ))
        })
    }

    /// Lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
