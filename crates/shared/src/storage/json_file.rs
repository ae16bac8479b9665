//! File-backed key-value store.
//!
//! Each key maps to one pretty-printed JSON file inside a root directory.

use super::KeyValueStore;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key-value store writing one JSON file per key
#[derive(Debug)]
pub struct JsonFileStore {
    /// Root storage directory
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        info!(storage_dir = %dir.display(), "JSON file store opened");

        Ok(Self { dir })
    }

    /// Root directory of this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the file path for a given key
    fn entry_path(&self, key: &str) -> PathBuf {
        // Sanitize key to create valid filename
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");

        self.dir.join(format!("{}.json", safe_key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.entry_path(key);
        if !path.exists() {
            debug!(key = key, "No stored value");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage file: {}", path.display()))?;

        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse storage file: {}", path.display()))?;

        debug!(key = key, "Loaded stored value");
        Ok(Some(value))
    }

    fn save(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.entry_path(key);

        let content = serde_json::to_string_pretty(value)
            .context("Failed to serialize stored value")?;

        // Write beside the target then rename, so a crash never leaves half a file
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write storage file: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace storage file: {}", path.display()))?;

        debug!(key = key, path = %path.display(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(false);
        }

        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove storage file: {}", path.display()))?;
        debug!(key = key, "Removed stored value");
        Ok(true)
    }
}
