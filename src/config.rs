//! Fixture configuration
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! or missing file yields the stock setup. Credentials come from here, never
//! from the environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fs::SessionStore;
use crate::models::constants::{DEFAULT_STORAGE_STATE_FILE, DEFAULT_USER_PASSWORD};
use crate::models::Credential;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Snapshot file, or the directory holding per-identity snapshots when
    /// `key_by_identity` is set.
    pub storage_state_path: PathBuf,
    pub default_user: Credential,
    pub new_user_password: String,
    pub key_by_identity: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            storage_state_path: PathBuf::from(DEFAULT_STORAGE_STATE_FILE),
            default_user: Credential::default(),
            new_user_password: DEFAULT_USER_PASSWORD.to_string(),
            key_by_identity: false,
        }
    }
}

impl FixtureConfig {
    /// Load from `path`. Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::load(path)?.unwrap_or_default())
    }

    pub fn with_default_user(mut self, credential: Credential) -> Self {
        self.default_user = credential;
        self
    }

    pub fn with_storage_state_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_state_path = path.into();
        self
    }

    /// Store for the default user's cached session.
    pub fn store(&self) -> SessionStore {
        if self.key_by_identity {
            SessionStore::keyed(&self.storage_state_path, &self.default_user)
        } else {
            SessionStore::new(&self.storage_state_path)
        }
    }
}
