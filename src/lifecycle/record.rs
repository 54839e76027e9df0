//! Persisted lifecycle records
//!
//! The CLI host keeps one record per generation in `lifecycle.json` under the
//! state directory, so lifecycle state survives between invocations.

use crate::cache::disk::write_atomic;
use crate::error::{SiteCacheError, SiteCacheResult};
use crate::lifecycle::state::WorkerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Lifecycle record for one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Cache generation identifier
    pub generation: String,

    /// Current lifecycle state
    pub state: WorkerState,

    /// Digest of the manifest this generation was installed from
    pub manifest_digest: String,

    /// Number of precached entries
    pub entries: usize,

    /// When install last completed
    pub installed_at: Option<DateTime<Utc>>,

    /// When activation completed
    pub activated_at: Option<DateTime<Utc>>,

    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

impl WorkerRecord {
    pub fn new(generation: impl Into<String>, manifest_digest: impl Into<String>) -> Self {
        Self {
            generation: generation.into(),
            state: WorkerState::Uninstalled,
            manifest_digest: manifest_digest.into(),
            entries: 0,
            installed_at: None,
            activated_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Record a state change
    pub fn transition(&mut self, state: WorkerState) {
        let now = Utc::now();
        match state {
            WorkerState::Installed if self.state != WorkerState::Installed => {
                self.installed_at = Some(now)
            }
            WorkerState::Active if self.state != WorkerState::Active => {
                self.activated_at = Some(now)
            }
            _ => {}
        }
        self.state = state;
        self.updated_at = now;
    }
}

/// All lifecycle records, keyed by generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerRegistry {
    #[serde(default)]
    workers: BTreeMap<String, WorkerRecord>,
}

impl WorkerRegistry {
    /// Load the registry, empty if the file does not exist
    pub async fn load(path: &Path) -> SiteCacheResult<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(SiteCacheError::io(
                    format!("reading lifecycle file {}", path.display()),
                    e,
                ))
            }
        };

        serde_json::from_str(&content).map_err(|e| SiteCacheError::LifecycleCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Replace the lifecycle file; readers see the old or new registry, never a mix
    pub async fn save(&self, path: &Path) -> SiteCacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SiteCacheError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path, content.as_bytes()).await
    }

    pub fn get(&self, generation: &str) -> Option<&WorkerRecord> {
        self.workers.get(generation)
    }

    pub fn upsert(&mut self, record: WorkerRecord) {
        self.workers.insert(record.generation.clone(), record);
    }

    pub fn remove(&mut self, generation: &str) -> Option<WorkerRecord> {
        self.workers.remove(generation)
    }

    /// The generation currently controlling fetches, if any
    pub fn active(&self) -> Option<&WorkerRecord> {
        self.workers
            .values()
            .filter(|r| r.state == WorkerState::Active)
            .max_by_key(|r| r.activated_at)
    }

    pub fn records(&self) -> impl Iterator<Item = &WorkerRecord> {
        self.workers.values()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
