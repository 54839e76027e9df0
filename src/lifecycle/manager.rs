//! Offline cache manager
//!
//! Runs the three lifecycle operations for one cache generation:
//!
//! - **install**: fetch every precache entry, then store them all in the
//!   generation's bucket. One failed or non-2xx fetch fails the install.
//! - **activate**: delete every bucket that is not the current generation.
//!   Individual deletion failures are reported, never fatal.
//! - **fetch**: cache-first lookup with network fallback. Never writes.
//!
//! Each operation is an `async fn`; the host awaits it before dispatching
//! the next lifecycle event.

use crate::cache::{
    CacheSettings, CacheStorage, CachedResponse, MatchScope, Request, RequestKey,
};
use crate::error::{SiteCacheError, SiteCacheResult};
use crate::lifecycle::state::{Trigger, WorkerState};
use crate::network::Fetcher;
use futures_util::future::{join_all, try_join_all};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: String,
    pub stored: usize,
    pub bytes: u64,
}

/// Result of a generation sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// The generation left in place
    pub kept: String,
    /// Stale buckets removed
    pub deleted: Vec<String>,
    /// Stale buckets that could not be removed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Where an intercepted request was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub source: FetchSource,
    pub response: CachedResponse,
}

/// Lifecycle manager for a single cache generation
pub struct OfflineCacheManager {
    settings: CacheSettings,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: Mutex<WorkerState>,
}

impl OfflineCacheManager {
    /// Create a manager for a generation that has never been installed
    pub fn new(
        settings: CacheSettings,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::restore(settings, storage, fetcher, WorkerState::Uninstalled)
    }

    /// Create a manager from a persisted state.
    ///
    /// In-flight states roll back, since their batch never settled.
    pub fn restore(
        settings: CacheSettings,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        state: WorkerState,
    ) -> Self {
        if state.is_in_flight() {
            debug!("Rolling back interrupted {} state", state);
        }
        Self {
            settings,
            storage,
            fetcher,
            state: Mutex::new(state.recovered()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn state(&self) -> WorkerState {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, trigger: Trigger) -> SiteCacheResult<()> {
        let mut state = self.lock();
        *state = state.begin(trigger)?;
        Ok(())
    }

    fn settle(&self, succeeded: bool) {
        let mut state = self.lock();
        *state = state.settle(succeeded);
    }

    /// Populate the current generation's bucket from the precache manifest
    pub async fn install(&self) -> SiteCacheResult<InstallReport> {
        self.begin(Trigger::Install)?;
        let result = self.precache().await;
        self.settle(result.is_ok());

        match &result {
            Ok(report) => info!(
                "Installed {}: {} entries, {} bytes",
                report.generation, report.stored, report.bytes
            ),
            Err(e) => warn!("Install of {} failed: {}", self.settings.generation(), e),
        }
        result
    }

    async fn precache(&self) -> SiteCacheResult<InstallReport> {
        let bucket = self.storage.open(self.settings.generation()).await?;
        info!("Opened cache {}", bucket.name());

        let requests = self.settings.precache_requests();
        let responses =
            try_join_all(requests.iter().map(|request| self.fetch_for_precache(request))).await?;

        // Nothing is stored unless every fetch succeeded
        let mut bytes = 0;
        for (request, response) in requests.iter().zip(responses) {
            bytes += response.body.len() as u64;
            bucket.put(request.key(), response).await?;
        }

        Ok(InstallReport {
            generation: self.settings.generation().to_string(),
            stored: requests.len(),
            bytes,
        })
    }

    async fn fetch_for_precache(&self, request: &Request) -> SiteCacheResult<CachedResponse> {
        let url = request.url.to_string();
        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| SiteCacheError::PrecacheFailed {
                url: url.clone(),
                reason: match e {
                    SiteCacheError::Network { reason, .. } => reason,
                    other => other.to_string(),
                },
            })?;

        if !response.is_ok() {
            return Err(SiteCacheError::PrecacheFailed {
                url,
                reason: format!("HTTP {}", response.status),
            });
        }

        Ok(response)
    }

    /// Become the active controller, sweeping stale generations
    pub async fn activate(&self) -> SiteCacheResult<SweepReport> {
        self.begin(Trigger::Activate)?;
        let result = self.sweep().await;
        self.settle(result.is_ok());

        match &result {
            Ok(report) => info!(
                "Activated {} ({} stale removed, {} failed)",
                report.kept,
                report.deleted.len(),
                report.failed.len()
            ),
            Err(e) => warn!("Activation of {} failed: {}", self.settings.generation(), e),
        }
        result
    }

    /// Delete every bucket except the current generation's.
    ///
    /// Deletions run independently; a failure is recorded and the rest
    /// continue. Only failing to enumerate buckets is an error. Safe to run
    /// repeatedly.
    pub async fn sweep(&self) -> SiteCacheResult<SweepReport> {
        let current = self.settings.generation();
        let stale: Vec<String> = self
            .storage
            .bucket_names()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;

        let mut report = SweepReport {
            kept: current.to_string(),
            ..SweepReport::default()
        };
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(true) => {
                    info!("Deleted stale cache {}", name);
                    report.deleted.push(name);
                }
                Ok(false) => debug!("Stale cache {} already gone", name),
                Err(e) => {
                    warn!("Failed to delete stale cache {}: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Answer an intercepted request, cache first.
    ///
    /// A miss is passed to the network unchanged and its response or error
    /// returned as is.
    pub async fn handle_fetch(&self, request: &Request) -> SiteCacheResult<FetchOutcome> {
        self.lock().begin(Trigger::Fetch)?;

        let key = request.key();
        if let Some(response) = self.lookup(&key).await? {
            debug!("Cache hit: {}", key);
            return Ok(FetchOutcome {
                source: FetchSource::Cache,
                response,
            });
        }

        debug!("Cache miss: {}", key);
        let response = self.fetcher.fetch(request).await?;
        Ok(FetchOutcome {
            source: FetchSource::Network,
            response,
        })
    }

    async fn lookup(&self, key: &RequestKey) -> SiteCacheResult<Option<CachedResponse>> {
        if !key.is_cacheable() {
            return Ok(None);
        }

        let names = match self.settings.match_scope() {
            MatchScope::Current => vec![self.settings.generation().to_string()],
            MatchScope::Any => self.storage.bucket_names().await?,
        };

        for name in names {
            if let Some(bucket) = self.storage.bucket(&name).await? {
                if let Some(response) = bucket.get(key).await? {
                    return Ok(Some(response));
                }
            }
        }

        Ok(None)
    }
}
