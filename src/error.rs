//! Error types for sitecache
//!
//! All modules use `SiteCacheResult<T>` as their return type.

use crate::lifecycle::{Trigger, WorkerState};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sitecache operations
pub type SiteCacheResult<T> = Result<T, SiteCacheError>;

/// All errors that can occur in sitecache
#[derive(Error, Debug)]
pub enum SiteCacheError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid cache settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Lifecycle errors
    #[error("Cannot {trigger} while worker is {state}")]
    InvalidTransition { trigger: Trigger, state: WorkerState },

    #[error("Precache failed for {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    #[error("{missing} precache path(s) missing from {site_dir}")]
    ManifestMismatch { missing: usize, site_dir: PathBuf },

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    // Storage errors
    #[error("Failed to delete cache bucket {name}: {reason}")]
    BucketDelete { name: String, reason: String },

    #[error("Corrupt cache entry {path}: {reason}")]
    EntryCorrupt { path: PathBuf, reason: String },

    #[error("Unreadable lifecycle file {path}: {reason}")]
    LifecycleCorrupt { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SiteCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    ///
    /// Nothing in the crate retries; hosts use this to decide whether to
    /// re-dispatch a lifecycle event.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::PrecacheFailed { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidTransition {
                trigger: Trigger::Install,
                state: WorkerState::Installed,
            } => Some("Run: sitecache activate"),
            Self::InvalidTransition {
                trigger: Trigger::Install,
                state: WorkerState::Active,
            } => Some("Bump cache.generation to deploy a new precache"),
            Self::InvalidTransition {
                trigger: Trigger::Activate,
                state: WorkerState::Uninstalled,
            } => Some("Run: sitecache install"),
            Self::ManifestMismatch { .. } => {
                Some("Rebuild the site or update cache.precache, then bump cache.generation")
            }
            Self::PrecacheFailed { .. } => {
                Some("Check every precache path against the deployed site: sitecache verify")
            }
            Self::LifecycleCorrupt { .. } => {
                Some("Delete the lifecycle file, then run: sitecache update")
            }
            Self::ConfigInvalid { .. } | Self::InvalidSettings(_) => {
                Some("Run: sitecache config show")
            }
            _ => None,
        }
    }
}
