//! Read-through cache for large API listings
//!
//! The machine catalog and region LMX listings are big and slow to fetch, so
//! the client keeps them in an injected [`Cache`]. Three backends ship with
//! the crate:
//!
//! - [`NoopCache`] never stores anything
//! - [`MemoryCache`] lives for the process (library default)
//! - [`FileCache`] keeps one JSON file per key on disk, shared between runs
//!
//! Caching is best effort: a backend that cannot read or write an entry
//! reports a miss and logs, it never fails the request.

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Default cache TTL (15 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Default prefix for cache keys
pub const DEFAULT_KEY_PREFIX: &str = "pmap_";

/// Keyed store for JSON documents with per-entry expiry
pub trait Cache: Send + Sync {
    /// Fetch a live entry
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store an entry for `ttl`
    fn set(&self, key: &str, value: &serde_json::Value, ttl: Duration);

    /// Drop every entry
    fn clear(&self) -> Result<()>;

    /// Backend identifier for logging/debugging
    fn name(&self) -> &'static str;
}

/// Cache that never stores anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl Cache for NoopCache {
    fn get(&self, _key: &str) -> Option<serde_json::Value> {
        None
    }

    fn set(&self, _key: &str, _value: &serde_json::Value, _ttl: Duration) {}

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Which cache backend to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    None,
    #[default]
    Memory,
    File,
}

/// Cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Lifetime of cached listings in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Prefix for cache keys, so several clients can share one store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Directory for the file backend (platform cache dir when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl_seconds: default_ttl_seconds(),
            key_prefix: default_key_prefix(),
            dir: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Build the configured backend
    pub fn build(&self) -> Result<Arc<dyn Cache>> {
        let cache: Arc<dyn Cache> = match self.backend {
            CacheBackend::None => Arc::new(NoopCache),
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::File => {
                let dir = match &self.dir {
                    Some(dir) => dir.clone(),
                    None => FileCache::default_dir()?,
                };
                Arc::new(FileCache::new(dir)?)
            }
        };
        tracing::debug!("Using {} cache backend", cache.name());
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_noop_cache_never_hits() {
        let cache = NoopCache;
        cache.set("k", &json!([1, 2]), DEFAULT_CACHE_TTL);
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(config.key_prefix, "pmap_");
    }

    #[test]
    fn test_cache_config_from_yaml() {
        let config: CacheConfig = serde_yaml_ng::from_str("backend: file\nttl_seconds: 60\n").unwrap();
        assert_eq!(config.backend, CacheBackend::File);
        assert_eq!(config.ttl_seconds, 60);
        assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
    }

    #[test]
    fn test_build_backends() {
        let temp_dir = TempDir::new().unwrap();

        let none = CacheConfig {
            backend: CacheBackend::None,
            ..Default::default()
        };
        assert_eq!(none.build().unwrap().name(), "none");

        assert_eq!(CacheConfig::default().build().unwrap().name(), "memory");

        let file = CacheConfig {
            backend: CacheBackend::File,
            dir: Some(temp_dir.path().join("cache")),
            ..Default::default()
        };
        let cache = file.build().unwrap();
        assert_eq!(cache.name(), "file");
        assert!(temp_dir.path().join("cache").is_dir());
    }
}
