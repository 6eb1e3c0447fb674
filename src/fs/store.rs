//! Session snapshot persistence
//!
//! A [`SessionStore`] owns exactly one snapshot location. It only reads and
//! writes; deciding whether the stored session is still usable is the
//! controller's job.
//!
//! Saves go through a temp file in the target directory followed by a rename,
//! under an exclusive sidecar lock, so parallel test workers never observe a
//! half-written snapshot. Loads take no lock and never write anything, so a
//! read-only cache directory can still be inspected.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::locking::SnapshotLock;
use crate::models::constants::IDENTITY_DIGEST_LEN;
use crate::models::{Credential, SessionSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no session snapshot at {}", .0.display())]
    NotFound(PathBuf),

    #[error("session snapshot at {} is not valid: {source}", .path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read session snapshot at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to persist session snapshot to {}: {source}", .path.display())]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize session snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store whose location is derived from the credential's email, so
    /// different identities never overwrite each other's snapshot.
    pub fn keyed<P: AsRef<Path>>(cache_dir: P, credential: &Credential) -> Self {
        let digest = hex::encode(Sha256::digest(credential.email.as_bytes()));
        let name = format!("storage-state-{}.json", &digest[..IDENTITY_DIGEST_LEN]);
        Self::new(cache_dir.as_ref().join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<SessionSnapshot, StoreError> {
        if !self.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;

        serde_json::from_str(&content).map_err(|source| StoreError::CorruptData {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace any existing snapshot with `snapshot`.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(snapshot).map_err(StoreError::Serialize)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|source| self.persist_error(source))?;

        let _lock =
            SnapshotLock::exclusive(&self.path).map_err(|source| self.persist_error(source))?;

        let mut staging =
            NamedTempFile::new_in(&parent).map_err(|source| self.persist_error(source))?;
        staging
            .write_all(content.as_bytes())
            .map_err(|source| self.persist_error(source))?;
        staging
            .as_file()
            .sync_all()
            .map_err(|source| self.persist_error(source))?;
        staging
            .persist(&self.path)
            .map_err(|err| self.persist_error(err.error))?;

        tracing::debug!(path = %self.path.display(), "session snapshot saved");
        Ok(())
    }

    /// Remove the snapshot. Returns whether one was present.
    pub fn clear(&self) -> Result<bool, StoreError> {
        if !self.exists() {
            return Ok(false);
        }

        let _lock = SnapshotLock::exclusive(&self.path).map_err(|source| self.io_error(source))?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        if source.kind() == io::ErrorKind::NotFound {
            return StoreError::NotFound(self.path.clone());
        }
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn persist_error(&self, source: io::Error) -> StoreError {
        StoreError::PersistFailure {
            path: self.path.clone(),
            source,
        }
    }
}
