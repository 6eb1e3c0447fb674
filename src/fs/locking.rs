//! Advisory locking for the shared snapshot file
//!
//! The snapshot itself is replaced by rename on every save, so the lock is
//! taken on a sidecar `<file>.lock` that is never replaced. Only writers lock:
//! the rename already guarantees readers see a complete file. Locks come from
//! `fs2` and are cooperative, so every writer must go through [`SnapshotLock`].

use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Held advisory lock; released when dropped.
#[derive(Debug)]
pub struct SnapshotLock {
    file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Acquire an exclusive (write) lock for `target`.
    pub fn exclusive(target: &Path) -> io::Result<Self> {
        let (file, path) = open_lock_file(target)?;
        file.lock_exclusive()?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        // Closing the handle releases the lock anyway; unlock eagerly so a
        // waiting writer does not depend on drop order of the File.
        let _ = FileExt::unlock(&self.file);
    }
}

/// Sidecar lock path for a snapshot: `storage-state.json` -> `storage-state.json.lock`.
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".lock");
    target.with_file_name(name)
}

fn open_lock_file(target: &Path) -> io::Result<(File, PathBuf)> {
    let path = lock_path(target);
    #[allow(clippy::suspicious_open_options)]
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&path)?;
    Ok((file, path))
}
