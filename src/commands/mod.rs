//! `authcache` subcommands for inspecting the cached session from a shell

pub mod clear;
pub mod status;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::FixtureConfig;
use crate::fs::SessionStore;

/// Pick the store a command operates on: an explicit snapshot path wins over
/// the one derived from the config file.
pub fn resolve_store(config_path: &Path, snapshot_path: Option<&Path>) -> Result<SessionStore> {
    if let Some(path) = snapshot_path {
        return Ok(SessionStore::new(path));
    }

    let config = FixtureConfig::load_or_default(config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;
    Ok(config.store())
}
