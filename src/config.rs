//! # Configuration Module
//!
//! Data directory discovery and runtime settings for Segue.
//!
//! ## Data Storage
//!
//! The record store lives in the platform-standard data directory:
//! - Linux: `~/.local/share/segue/records.db`
//! - macOS: `~/Library/Application Support/segue/records.db`
//! - Windows: `%APPDATA%\segue\records.db`
//!
//! Settings are read from `config.json` in the platform config directory
//! (`~/.config/segue/config.json` on Linux). A missing file means defaults.
//!
//! ```json
//! {
//!     "db_path": "/srv/segue/records.db",
//!     "fallback_pool": { "tracks": [12, 7, 40] },
//!     "seed": 42
//! }
//! ```
//!
//! `fallback_pool` is one of `"top_tracks"` (the default: the list stored by
//! `segue import --top-tracks`, or every track when none was stored),
//! `"all_tracks"`, or `{ "tracks": [...] }`.

use crate::catalog;
use crate::record::TrackId;
use crate::store::RecordStore;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "segue";

fn ensure_dir(base: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    let base = base.ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system {what} directory. \
             Please ensure your platform supports standard {what} directories."
        )
    })?;

    let dir = base.join(APP_DIR);
    fs::create_dir_all(&dir).with_context(|| {
        format!(
            "Failed to create Segue {what} directory at {}. Please check file permissions.",
            dir.display()
        )
    })?;
    Ok(dir)
}

/// Platform data directory for Segue, created if missing.
///
/// # Errors
///
/// Fails when the platform has no data directory or it cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    ensure_dir(dirs::data_dir(), "data")
}

/// Default location of the record store.
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("records.db"))
}

/// Default location of the settings file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(ensure_dir(dirs::config_dir(), "config")?.join("config.json"))
}

/// Where the fallback selector draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPool {
    /// The top-tracks list saved in the store, or every track if there is none.
    #[default]
    TopTracks,
    /// Every track id in the store.
    AllTracks,
    /// A fixed list.
    Tracks(Vec<TrackId>),
}

impl FallbackPool {
    /// Turn the setting into concrete ids, listing the store only if needed.
    pub fn resolve<S, F>(&self, store: &S, all_tracks: F) -> Result<Vec<TrackId>>
    where
        S: RecordStore + ?Sized,
        F: FnOnce() -> Result<Vec<TrackId>>,
    {
        match self {
            Self::TopTracks => match catalog::load_top_tracks(store)? {
                Some(top_tracks) if !top_tracks.is_empty() => {
                    debug!("Falling back to {} stored top tracks", top_tracks.len());
                    Ok(top_tracks)
                }
                _ => {
                    debug!("No top tracks stored, falling back to every track");
                    all_tracks()
                }
            },
            Self::AllTracks => all_tracks(),
            Self::Tracks(ids) => Ok(ids.clone()),
        }
    }
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to the record store
    pub db_path: PathBuf,
    pub fallback_pool: FallbackPool,
    /// Fixed RNG seed. `None` means fresh randomness on every run.
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: get_db_path().unwrap_or_else(|_| PathBuf::from("records.db")),
            fallback_pool: FallbackPool::default(),
            seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Read settings from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Create configuration with explicit database path
    #[must_use]
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::store::{MemoryStore, RecordWriter, StoreKey};
    use tempfile::TempDir;

    #[test]
    fn test_get_db_path_structure() {
        let path = get_db_path().expect("Should get valid path");

        assert!(path.is_absolute(), "Database path should be absolute");
        assert_eq!(path.file_name().unwrap(), "records.db");
        assert_eq!(path.parent().unwrap().file_name().unwrap(), "segue");
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_missing_config_gives_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let config = RuntimeConfig::load(&dir.path().join("absent.json"))?;

        assert_eq!(config.fallback_pool, FallbackPool::TopTracks);
        assert_eq!(config.seed, None);
        Ok(())
    }

    #[test]
    fn test_partial_config_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"fallback_pool":{"tracks":[5,6]},"seed":9}"#)?;

        let config = RuntimeConfig::load(&path)?;
        assert_eq!(config.fallback_pool, FallbackPool::Tracks(vec![5, 6]));
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.db_path, RuntimeConfig::default().db_path);
        Ok(())
    }

    #[test]
    fn test_invalid_config_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json")?;

        let err = RuntimeConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
        Ok(())
    }

    #[test]
    fn test_fallback_pool_resolution() -> Result<()> {
        let store = MemoryStore::new();
        let fixed = FallbackPool::Tracks(vec![1, 2]);

        assert_eq!(
            fixed.resolve(&store, || anyhow::bail!("store should not be listed"))?,
            vec![1, 2]
        );
        assert_eq!(FallbackPool::AllTracks.resolve(&store, || Ok(vec![3]))?, vec![3]);
        Ok(())
    }

    #[test]
    fn test_top_tracks_pool() -> Result<()> {
        let store = MemoryStore::new();

        // Nothing stored yet: every track.
        assert_eq!(FallbackPool::TopTracks.resolve(&store, || Ok(vec![3, 4]))?, vec![3, 4]);

        store.set(StoreKey::TopTracks, codec::encode_top_tracks(&[8, 6])?)?;
        let pool = FallbackPool::TopTracks
            .resolve(&store, || anyhow::bail!("store should not be listed"))?;
        assert_eq!(pool, vec![8, 6]);
        assert_eq!(FallbackPool::AllTracks.resolve(&store, || Ok(vec![3, 4]))?, vec![3, 4]);
        Ok(())
    }

    #[test]
    fn test_top_tracks_setting_parses() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"fallback_pool":"all_tracks"}"#)?;
        assert_eq!(RuntimeConfig::load(&path)?.fallback_pool, FallbackPool::AllTracks);

        fs::write(&path, r#"{"fallback_pool":"top_tracks"}"#)?;
        assert_eq!(RuntimeConfig::load(&path)?.fallback_pool, FallbackPool::TopTracks);
        Ok(())
    }

    #[test]
    fn test_with_db_path() {
        let config = RuntimeConfig::with_db_path(PathBuf::from("/tmp/records.db"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/records.db"));
    }
}
