//! Client configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. Explicit values set by the caller (CLI flags)
//! 2. `PINBALLMAP_*` environment variables
//! 3. `config.yaml` in the platform config directory
//!    (`~/.config/pinballmap/config.yaml` on Linux) or an explicit path
//! 4. Built-in defaults
//!
//! ```yaml
//! authentication_token: "..."
//! user_email: owner@example.com
//! location_id: 1234
//! region_name: portland
//! cache:
//!   backend: file
//!   ttl_seconds: 900
//! matching:
//!   min_score: 2
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::CacheConfig;
use crate::error::{PinballMapError, Result};
use crate::matching::{NameMatcher, DEFAULT_MIN_SCORE, DEFAULT_MODEL_ENDINGS, DEFAULT_STOP_WORDS};

/// Pinball Map API base URL (no trailing slash)
pub const DEFAULT_BASE_URL: &str = "https://pinballmap.com/api/v1";

/// Pinball Map API version this client speaks
pub const API_VERSION: &str = "1.0";

/// Environment variables read by [`ClientConfig::apply_env`]
pub const ENV_TOKEN: &str = "PINBALLMAP_TOKEN";
pub const ENV_EMAIL: &str = "PINBALLMAP_EMAIL";
pub const ENV_PASSWORD: &str = "PINBALLMAP_PASSWORD";
pub const ENV_LOCATION_ID: &str = "PINBALLMAP_LOCATION_ID";
pub const ENV_REGION: &str = "PINBALLMAP_REGION";
pub const ENV_BASE_URL: &str = "PINBALLMAP_BASE_URL";
pub const ENV_DRY_RUN: &str = "PINBALLMAP_DRY_RUN";

/// Everything a [`crate::PinballMapClient`] needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API token, needed for all write operations
    #[serde(default)]
    pub authentication_token: Option<String>,

    /// Account email, needed for all write operations
    #[serde(default)]
    pub user_email: Option<String>,

    /// Account password, used to obtain a token when none is set
    #[serde(default)]
    pub user_password: Option<String>,

    /// The location this client manages
    #[serde(default)]
    pub location_id: Option<u64>,

    /// Region the location belongs to (e.g. "chicago")
    #[serde(default)]
    pub region_name: Option<String>,

    /// Log write operations instead of sending them
    #[serde(default)]
    pub dry_run: bool,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Name matching settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,

    #[serde(default = "default_model_endings")]
    pub model_endings: Vec<String>,

    /// Minimum score for `machine_by_name` results
    #[serde(default = "default_min_score")]
    pub min_score: i32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_stop_words() -> Vec<String> {
    DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect()
}

fn default_model_endings() -> Vec<String> {
    DEFAULT_MODEL_ENDINGS.iter().map(|s| s.to_string()).collect()
}

fn default_min_score() -> i32 {
    DEFAULT_MIN_SCORE
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            stop_words: default_stop_words(),
            model_endings: default_model_endings(),
            min_score: default_min_score(),
        }
    }
}

impl MatchingConfig {
    pub fn matcher(&self) -> NameMatcher {
        NameMatcher::new(&self.stop_words, &self.model_endings)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            authentication_token: None,
            user_email: None,
            user_password: None,
            location_id: None,
            region_name: None,
            dry_run: false,
            timeout_seconds: default_timeout(),
            cache: CacheConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load file config then apply environment overrides
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PinballMapError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_yaml_ng::from_str(&content).map_err(|e| {
            PinballMapError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Platform config file location
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pinballmap", "pinballmap")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("pinballmap")))
            .map(|dir| dir.join("config.yaml"))
    }

    /// Apply `PINBALLMAP_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any name → value lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup(ENV_TOKEN) {
            self.authentication_token = Some(token);
        }
        if let Some(email) = lookup(ENV_EMAIL) {
            self.user_email = Some(email);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.user_password = Some(password);
        }
        if let Some(region) = lookup(ENV_REGION) {
            self.region_name = Some(region);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_LOCATION_ID) {
            let id = raw.trim().parse::<u64>().map_err(|_| {
                PinballMapError::Config(format!("{ENV_LOCATION_ID} must be a number, got '{raw}'"))
            })?;
            self.location_id = Some(id);
        }
        if let Some(raw) = lookup(ENV_DRY_RUN) {
            self.dry_run = parse_bool(&raw).ok_or_else(|| {
                PinballMapError::Config(format!("{ENV_DRY_RUN} must be true or false, got '{raw}'"))
            })?;
        }
        Ok(())
    }

    /// Check the values that would otherwise fail late
    pub fn validate(&mut self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(PinballMapError::Config(format!(
                "base_url must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        if self.timeout_seconds == 0 {
            return Err(PinballMapError::Config(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
