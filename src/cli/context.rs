//! Host context shared by lifecycle commands
//!
//! Plays the part of the service-worker host: owns the on-disk storage, the
//! HTTP fetcher, the persisted lifecycle records and the journal, and builds
//! managers restored to their recorded state.

use crate::cache::{CacheSettings, CacheStorage, DiskStorage};
use crate::config::{Config, ConfigManager};
use crate::error::SiteCacheResult;
use crate::journal::Journal;
use crate::lifecycle::{OfflineCacheManager, WorkerRecord, WorkerRegistry, WorkerState};
use crate::network::{Fetcher, HttpFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HostContext {
    pub settings: CacheSettings,
    pub storage: Arc<DiskStorage>,
    pub fetcher: Arc<HttpFetcher>,
    pub journal: Journal,
    pub registry: WorkerRegistry,
    lifecycle_path: PathBuf,
}

impl HostContext {
    /// Load settings, storage and lifecycle records for a config
    pub async fn load(config: &Config) -> SiteCacheResult<Self> {
        let settings = config.cache_settings()?;
        ConfigManager::ensure_state_dirs(config).await?;

        let lifecycle_path = ConfigManager::lifecycle_path(config);
        let registry = WorkerRegistry::load(&lifecycle_path).await?;
        debug!(
            "Loaded lifecycle records from {}",
            lifecycle_path.display()
        );

        Ok(Self {
            settings,
            storage: Arc::new(DiskStorage::new(ConfigManager::buckets_dir(config))),
            fetcher: Arc::new(HttpFetcher::new(Duration::from_secs(
                config.origin.timeout_secs,
            ))),
            journal: Journal::new(config.general.journal, ConfigManager::journal_path(config)),
            registry,
            lifecycle_path,
        })
    }

    fn storage(&self) -> Arc<dyn CacheStorage> {
        self.storage.clone()
    }

    fn fetcher(&self) -> Arc<dyn Fetcher> {
        self.fetcher.clone()
    }

    /// Recorded state of the configured generation
    pub fn current_state(&self) -> WorkerState {
        self.registry
            .get(self.settings.generation())
            .map(|r| r.state)
            .unwrap_or(WorkerState::Uninstalled)
    }

    /// Manager for the configured generation, restored to its recorded state
    pub fn manager(&self) -> OfflineCacheManager {
        OfflineCacheManager::restore(
            self.settings.clone(),
            self.storage(),
            self.fetcher(),
            self.current_state(),
        )
    }

    /// Manager for whichever generation is currently active, if any.
    ///
    /// This may be an older generation than the configured one while an
    /// update is installed but not yet activated.
    pub fn controller(&self) -> SiteCacheResult<Option<OfflineCacheManager>> {
        let Some(active) = self.registry.active() else {
            return Ok(None);
        };

        let settings = if active.generation == self.settings.generation() {
            self.settings.clone()
        } else {
            CacheSettings::new(
                active.generation.clone(),
                self.settings.origin().clone(),
                vec![],
            )?
            .with_match_scope(self.settings.match_scope())
        };

        Ok(Some(OfflineCacheManager::restore(
            settings,
            self.storage(),
            self.fetcher(),
            WorkerState::Active,
        )))
    }

    /// Persist the manager's state for the configured generation
    pub async fn persist(
        &mut self,
        manager: &OfflineCacheManager,
        entries: Option<usize>,
    ) -> SiteCacheResult<()> {
        let generation = self.settings.generation();
        let mut record = self
            .registry
            .get(generation)
            .cloned()
            .unwrap_or_else(|| WorkerRecord::new(generation, self.settings.manifest_digest()));

        if let Some(entries) = entries {
            record.entries = entries;
            record.manifest_digest = self.settings.manifest_digest();
        }
        record.transition(manager.state());
        self.registry.upsert(record);
        self.registry.save(&self.lifecycle_path).await
    }

    /// Persist without masking an earlier error
    pub async fn persist_after_failure(&mut self, manager: &OfflineCacheManager) {
        if let Err(e) = self.persist(manager, None).await {
            warn!("Failed to record lifecycle state: {}", e);
        }
    }

    /// Drop records for every generation except the configured one
    pub async fn retire_other_generations(&mut self) -> SiteCacheResult<Vec<String>> {
        let current = self.settings.generation().to_string();
        let retired: Vec<String> = self
            .registry
            .records()
            .map(|r| r.generation.clone())
            .filter(|g| *g != current)
            .collect();

        for generation in &retired {
            self.registry.remove(generation);
        }
        self.registry.save(&self.lifecycle_path).await?;
        Ok(retired)
    }
}
