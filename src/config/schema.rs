//! Configuration schema for sitecache
//!
//! Configuration is stored at `~/.config/sitecache/config.toml`

use crate::cache::{CacheSettings, MatchScope, DEFAULT_GENERATION, DEFAULT_PRECACHE};
use crate::error::{SiteCacheError, SiteCacheResult};
use crate::network::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache generation and precache manifest
    pub cache: CacheConfig,

    /// Site origin the manifest is fetched from
    pub origin: OriginConfig,

    /// Where buckets and lifecycle state live
    pub storage: StorageConfig,
}

impl Config {
    /// Build validated cache settings from the `[cache]` and `[origin]` sections
    pub fn cache_settings(&self) -> SiteCacheResult<CacheSettings> {
        let origin = self.origin.url()?;
        Ok(CacheSettings::new(
            self.cache.generation.clone(),
            origin,
            self.cache.precache.clone(),
        )?
        .with_match_scope(self.cache.match_scope))
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append lifecycle events to the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Current cache generation identifier
    pub generation: String,

    /// Root-relative paths fetched at install
    pub precache: Vec<String>,

    /// Buckets a fetch may be answered from: "current" or "any"
    pub match_scope: MatchScope,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION.to_string(),
            precache: DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect(),
            match_scope: MatchScope::default(),
        }
    }
}

/// Origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Deployed site root
    pub base_url: String,

    /// Global timeout for one request, in seconds
    pub timeout_secs: u64,
}

impl OriginConfig {
    pub fn url(&self) -> SiteCacheResult<Url> {
        Url::parse(&self.base_url).map_err(|e| SiteCacheError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the state directory
    pub state_dir: Option<PathBuf>,
}
