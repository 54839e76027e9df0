//! In-memory cache storage

use crate::cache::entry::{CachedResponse, RequestKey};
use crate::cache::storage::{CacheBucket, CacheStorage};
use crate::error::SiteCacheResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local storage. Cloning shares the same buckets.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    buckets: Arc<RwLock<BTreeMap<String, Arc<MemoryBucket>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn bucket_names(&self) -> SiteCacheResult<Vec<String>> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn open(&self, name: &str) -> SiteCacheResult<Arc<dyn CacheBucket>> {
        let mut buckets = self.buckets.write().await;
        let bucket: Arc<dyn CacheBucket> = buckets
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryBucket::new(name)))
            .clone();
        Ok(bucket)
    }

    async fn bucket(&self, name: &str) -> SiteCacheResult<Option<Arc<dyn CacheBucket>>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(name)
            .map(|b| Arc::clone(b) as Arc<dyn CacheBucket>))
    }

    async fn delete(&self, name: &str) -> SiteCacheResult<bool> {
        Ok(self.buckets.write().await.remove(name).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug)]
pub struct MemoryBucket {
    name: String,
    entries: RwLock<BTreeMap<RequestKey, CachedResponse>>,
}

impl MemoryBucket {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl CacheBucket for MemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &RequestKey) -> SiteCacheResult<Option<CachedResponse>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: RequestKey, response: CachedResponse) -> SiteCacheResult<()> {
        self.entries.write().await.insert(key, response);
        Ok(())
    }

    async fn keys(&self) -> SiteCacheResult<Vec<RequestKey>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
