//! On-disk cache backend
//!
//! Each key is stored as `entry_<hash>.json` holding the value and the time
//! it was written. Entries older than their TTL are treated as misses.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::Cache;
use crate::error::{PinballMapError, Result};

/// File name prefix of every cache entry
const ENTRY_PREFIX: &str = "entry_";

/// Cached value metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedEntry {
    /// Cache key, kept for debugging
    key: String,

    /// When the entry was written (Unix timestamp)
    cached_at: u64,

    /// Lifetime in seconds
    ttl_secs: u64,

    value: serde_json::Value,
}

/// Cache that survives between CLI runs
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Use `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Platform cache directory, e.g. `~/.cache/pinballmap` on Linux
    pub fn default_dir() -> Result<PathBuf> {
        directories::ProjectDirs::from("com", "pinballmap", "pinballmap")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .or_else(|| dirs::cache_dir().map(|d| d.join("pinballmap")))
            .ok_or_else(|| {
                PinballMapError::Config("Could not determine cache directory".to_string())
            })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get cache file path for a key
    fn path_for_key(&self, key: &str) -> PathBuf {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();

        self.dir.join(format!("{ENTRY_PREFIX}{hash:016x}.json"))
    }

    /// Whether `path` is named like an entry this cache wrote
    fn is_entry_file(path: &Path) -> bool {
        path.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(ENTRY_PREFIX) && name.ends_with(".json"))
    }

    fn read_entry(path: &Path) -> Option<CachedEntry> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Ignoring unreadable cache file {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.path_for_key(key);
        let entry = Self::read_entry(&path)?;

        let age = unix_now().saturating_sub(entry.cached_at);
        if age >= entry.ttl_secs {
            tracing::debug!("Cache expired for {} (age: {}s)", key, age);
            return None;
        }

        tracing::debug!("Using cached {} (age: {}s)", key, age);
        Some(entry.value)
    }

    fn set(&self, key: &str, value: &serde_json::Value, ttl: Duration) {
        let path = self.path_for_key(key);
        let entry = CachedEntry {
            key: key.to_string(),
            cached_at: unix_now(),
            ttl_secs: ttl.as_secs(),
            value: value.clone(),
        };

        let written = serde_json::to_vec(&entry)
            .map_err(std::io::Error::from)
            .and_then(|bytes| std::fs::write(&path, bytes));

        match written {
            Ok(()) => tracing::debug!("Saved {} to cache: {}", key, path.display()),
            Err(e) => tracing::warn!("Failed to save {} to cache: {}", key, e),
        }
    }

    /// Remove the entries this cache wrote; other files in `dir` are left alone
    fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if Self::is_entry_file(&path) {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
