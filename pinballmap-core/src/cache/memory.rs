//! In-process cache backend

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::Cache;
use crate::error::Result;

struct Entry {
    expires_at: Instant,
    value: serde_json::Value,
}

/// Process-local cache with per-entry expiry
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().ok()?;
        let expired = match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            tracing::debug!("Cache expired for {}", key);
            entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: &serde_json::Value, ttl: Duration) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        expires_at: Instant::now() + ttl,
                        value: value.clone(),
                    },
                );
            }
            Err(_) => tracing::warn!("Memory cache lock poisoned; not caching {}", key),
        }
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
